//! 价格明细
//!
//! 所有金额字段在输出时各舍入一次（2 位小数，half-up）

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sillon_domain_core::{Currency, Money};

use crate::domain::enums::VatTreatment;

/// 计价过程中的非阻断提示
///
/// 计价仍然完成，由调用方展示给操作员
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum PricingWarning {
    /// 国家为空或无法识别，按出口（0%）处理
    UnrecognizedCountry { input: String },
    /// 税号格式错误，按未核验处理
    InvalidVatNumberFormat { input: String },
    /// 税号核验服务不可用，按未核验处理
    VatVerificationUnavailable { reason: String },
}

/// 调用方已确定的税率与标签
///
/// 修改已有订单时沿用订单上保存的税率，不重新判定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatOverride {
    pub rate_percent: Decimal,
    pub label: String,
    /// 原始判定结果，缺省时记为 `Override`
    #[serde(default)]
    pub treatment: Option<VatTreatment>,
}

/// 价格明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// 折前小计
    pub subtotal_gross: Decimal,
    /// 折扣金额（客户折扣率 + 订单级固定折扣）
    pub discount_amount: Decimal,
    /// 折后小计（计税基数）
    pub subtotal_net: Decimal,
    pub vat_rate_percent: Decimal,
    pub vat_amount: Decimal,
    pub vat_label: String,
    pub vat_treatment: VatTreatment,
    pub shipping_amount: Decimal,
    pub shipping_is_free: bool,
    pub shipping_zone_name: String,
    pub total: Decimal,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PricingWarning>,
}

/// 单据（发票、装箱单）直接读取的四个合计字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub shipping_amount: Money,
    pub total: Money,
}

impl PriceBreakdown {
    pub fn document_totals(&self) -> DocumentTotals {
        let money = |amount: Decimal| Money::new(amount, self.currency.clone());
        DocumentTotals {
            subtotal: money(self.subtotal_net),
            tax_amount: money(self.vat_amount),
            shipping_amount: money(self.shipping_amount),
            total: money(self.total),
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// 以本明细的税率构造覆盖值，供订单修改后重新计价
    pub fn vat_override(&self) -> VatOverride {
        VatOverride {
            rate_percent: self.vat_rate_percent,
            label: self.vat_label.clone(),
            treatment: Some(self.vat_treatment),
        }
    }
}
