//! Sales order metrics
//!
//! 业务指标记录

use metrics::counter;

use crate::domain::value_objects::{CountryCode, PriceBreakdown};

/// 记录一次计价
pub fn record_quote(channel: &str, breakdown: &PriceBreakdown) {
    let labels = [
        ("channel", channel.to_string()),
        ("vat_treatment", breakdown.vat_treatment.as_str().to_string()),
        ("free_shipping", breakdown.shipping_is_free.to_string()),
    ];
    counter!("sd_so_quotes_total", &labels).increment(1);

    if breakdown.has_warnings() {
        counter!("sd_so_quote_warnings_total", &labels).increment(breakdown.warnings.len() as u64);
    }
}

/// 记录缺少运费区域（配置错误）
pub fn record_zone_not_found(destination: &str) {
    let labels = [("destination", destination_label(destination))];
    counter!("sd_so_shipping_zone_not_found_total", &labels).increment(1);
}

/// 记录订单创建
pub fn record_order_created(channel: &str) {
    let labels = [("channel", channel.to_string())];
    counter!("sd_so_orders_created_total", &labels).increment(1);
}

/// 记录 Pro 门户因最低起订金额被拦截
pub fn record_minimum_order_rejected() {
    counter!("sd_so_minimum_order_rejected_total").increment(1);
}

/// 记录明细对账
pub fn record_reconciliation(success: bool, created: usize, updated: usize, deleted: usize) {
    let labels = [("success", success.to_string())];
    counter!("sd_so_reconciliations_total", &labels).increment(1);

    if success {
        counter!("sd_so_order_items_created_total").increment(created as u64);
        counter!("sd_so_order_items_updated_total").increment(updated as u64);
        counter!("sd_so_order_items_deleted_total").increment(deleted as u64);
    }
}

/// 记录税号核验结果
pub fn record_vat_verification(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!("sd_so_vat_verifications_total", &labels).increment(1);
}

/// 目的地标签只取已知国家的 ISO-2 代码，其余归为 unknown
fn destination_label(destination: &str) -> String {
    CountryCode::normalize(destination)
        .filter(CountryCode::is_known)
        .map_or_else(|| "unknown".to_string(), |code| code.to_string())
}
