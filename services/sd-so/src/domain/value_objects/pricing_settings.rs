//! 计价参数
//!
//! 由调用方显式传入每一次计价，核心不读取任何全局配置

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sillon_domain_core::Currency;

use super::CountryCode;

/// 计价参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// 卖方国家
    pub seller_country: CountryCode,
    /// 标准增值税率（百分比，如 20）
    pub standard_vat_rate_percent: Decimal,
    /// 默认币种
    pub default_currency: Currency,
    /// Pro 门户最低起订金额（折后、税前）
    pub minimum_pro_order_amount: Decimal,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            seller_country: CountryCode::france(),
            standard_vat_rate_percent: Decimal::from(20),
            default_currency: Currency::eur(),
            minimum_pro_order_amount: Decimal::from(100),
        }
    }
}
