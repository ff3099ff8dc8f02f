//! 订单计价引擎
//!
//! 后台手工录单与 Pro 门户结账共用同一套计算

use rust_decimal::Decimal;
use sillon_domain_core::{Currency, round_money};

use super::{CartMetrics, ShippingRateResolver, VatClassification, VatClassifier};
use crate::domain::entities::{Customer, LineItem, ShippingZone};
use crate::domain::enums::VatTreatment;
use crate::domain::value_objects::{
    CountryCode, PriceBreakdown, PricingSettings, PricingWarning, VatOverride,
};
use crate::error::PricingError;

/// 单次计价的输入（订单行之外）
#[derive(Debug, Clone)]
pub struct PricingContext<'a> {
    pub customer: &'a Customer,
    pub zones: &'a [ShippingZone],
    /// 收货国家，默认取客户国家
    pub shipping_country: &'a str,
    /// 订单级固定折扣（手工录单）
    pub order_level_discount: Decimal,
    pub currency: Currency,
    /// 调用方已确定的税率，存在时跳过税率判定
    pub vat_override: Option<VatOverride>,
    /// 外部核验结果；未核验、超时或失败时为 false
    pub vat_validated: bool,
}

impl<'a> PricingContext<'a> {
    pub fn new(customer: &'a Customer, zones: &'a [ShippingZone], currency: Currency) -> Self {
        Self {
            customer,
            zones,
            shipping_country: &customer.country,
            order_level_discount: Decimal::ZERO,
            currency,
            vat_override: None,
            vat_validated: false,
        }
    }

    pub fn with_shipping_country(mut self, country: &'a str) -> Self {
        self.shipping_country = country;
        self
    }

    pub fn with_order_level_discount(mut self, discount: Decimal) -> Self {
        self.order_level_discount = discount;
        self
    }

    pub fn with_vat_override(mut self, vat_override: VatOverride) -> Self {
        self.vat_override = Some(vat_override);
        self
    }

    pub fn with_vat_validated(mut self, validated: bool) -> Self {
        self.vat_validated = validated;
        self
    }
}

/// 计价引擎
#[derive(Debug, Clone)]
pub struct PricingEngine {
    settings: PricingSettings,
    classifier: VatClassifier,
}

impl PricingEngine {
    pub fn new(settings: PricingSettings) -> Self {
        let classifier = VatClassifier::from_settings(&settings);
        Self {
            settings,
            classifier,
        }
    }

    pub fn settings(&self) -> &PricingSettings {
        &self.settings
    }

    /// 计算价格明细
    ///
    /// 订单行须已通过校验。中间计算不舍入，每个输出字段只舍入一次；
    /// 税额与运费先舍入再计入总额，保证与展示值一致
    pub fn price(
        &self,
        items: &[LineItem],
        ctx: &PricingContext<'_>,
    ) -> Result<PriceBreakdown, PricingError> {
        ctx.customer.validate()?;
        if ctx.order_level_discount < Decimal::ZERO {
            return Err(PricingError::InvalidDiscount(format!(
                "order-level discount must be >= 0, got {}",
                ctx.order_level_discount
            )));
        }

        let subtotal_gross = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| {
                item.line_total().and_then(|t| acc.checked_add(t))
            })
            .ok_or_else(|| PricingError::overflow("subtotal"))?;

        // 百分比折扣与固定折扣相加，且不超过小计；溢出的折扣必然超过小计
        let discount = subtotal_gross
            .checked_mul(ctx.customer.discount_rate())
            .and_then(|d| d.checked_add(ctx.order_level_discount))
            .map_or(subtotal_gross, |d| d.min(subtotal_gross));
        let subtotal_net = subtotal_gross - discount;

        let vat = self.vat_for(ctx);
        let vat_amount = subtotal_net
            .checked_mul(vat.rate_percent)
            .map(|v| round_money(v / Decimal::ONE_HUNDRED))
            .ok_or_else(|| PricingError::overflow("VAT amount"))?;

        let cart = CartMetrics::from_items(items, subtotal_net)?;
        let shipping = ShippingRateResolver::resolve(ctx.zones, ctx.shipping_country, &cart)?;

        let total = subtotal_net
            .checked_add(vat_amount)
            .and_then(|t| t.checked_add(shipping.amount))
            .map(|t| round_money(t).max(round_money(Decimal::ZERO)))
            .ok_or_else(|| PricingError::overflow("total"))?;

        let mut warnings = vat.warnings;
        if ctx.shipping_country != ctx.customer.country
            && !CountryCode::is_recognized(ctx.shipping_country)
        {
            warnings.push(PricingWarning::UnrecognizedCountry {
                input: ctx.shipping_country.to_string(),
            });
        }

        Ok(PriceBreakdown {
            subtotal_gross: round_money(subtotal_gross),
            discount_amount: round_money(discount),
            subtotal_net: round_money(subtotal_net),
            vat_rate_percent: vat.rate_percent,
            vat_amount,
            vat_label: vat.label,
            vat_treatment: vat.treatment,
            shipping_amount: shipping.amount,
            shipping_is_free: shipping.is_free,
            shipping_zone_name: shipping.zone_name,
            total,
            currency: ctx.currency.clone(),
            warnings,
        })
    }

    /// 折后小计是否低于 Pro 门户最低起订金额
    ///
    /// 引擎本身不拦截，由 Pro 结账流程决定是否阻止提交
    pub fn below_minimum_order(&self, breakdown: &PriceBreakdown) -> bool {
        breakdown.subtotal_net < self.settings.minimum_pro_order_amount
    }

    fn vat_for(&self, ctx: &PricingContext<'_>) -> VatClassification {
        match &ctx.vat_override {
            Some(o) => VatClassification {
                rate_percent: o.rate_percent,
                label: o.label.clone(),
                treatment: o.treatment.unwrap_or(VatTreatment::Override),
                warnings: Vec::new(),
            },
            None => self.classifier.classify(
                &ctx.customer.country,
                ctx.customer.customer_type,
                ctx.customer.vat_number.as_deref(),
                ctx.vat_validated,
            ),
        }
    }
}
