//! 独立计价请求
//!
//! 不读取仓储，所有输入随请求给出；供命令行报价工具使用

use rust_decimal::Decimal;
use serde::Deserialize;
use sillon_domain_core::Currency;
use sillon_errors::{AppError, AppResult};

use crate::domain::entities::{
    Customer, LineItem, LineItemInput, ShippingMethod, ShippingSelection, ShippingZone,
    validate_zones,
};
use crate::domain::services::{PricingContext, PricingEngine};
use crate::domain::value_objects::{PriceBreakdown, PricingSettings, VatOverride};
use crate::error::PricingError;

/// 计价请求
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub customer: Customer,
    /// 区域表（按优先顺序）
    #[serde(default)]
    pub zones: Vec<ShippingZone>,
    /// 手工选择的运输方式，存在时忽略区域表
    #[serde(default)]
    pub shipping_method: Option<ShippingMethod>,
    #[serde(default)]
    pub shipping_country: Option<String>,
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub order_level_discount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub vat_validated: bool,
    #[serde(default)]
    pub vat_override: Option<VatOverride>,
}

impl QuoteRequest {
    pub fn price(self, engine: &PricingEngine) -> AppResult<PriceBreakdown> {
        let lines = validate_lines(self.items)?;
        let selection = match self.shipping_method {
            Some(method) => ShippingSelection::Method(method),
            None => ShippingSelection::Zones,
        };
        let zones = selection.zones(&self.zones);
        validate_zones(&zones)?;
        let currency = resolve_currency(self.currency.as_deref(), engine.settings())?;
        let shipping_country = self
            .shipping_country
            .unwrap_or_else(|| self.customer.country.clone());

        let mut ctx = PricingContext::new(&self.customer, &zones, currency)
            .with_shipping_country(&shipping_country)
            .with_order_level_discount(self.order_level_discount)
            .with_vat_validated(self.vat_validated);
        if let Some(vat_override) = self.vat_override {
            ctx = ctx.with_vat_override(vat_override);
        }

        Ok(engine.price(&lines, &ctx)?)
    }
}

/// 校验全部订单行，遇到第一行错误即返回
pub(crate) fn validate_lines(inputs: Vec<LineItemInput>) -> Result<Vec<LineItem>, PricingError> {
    inputs.into_iter().map(LineItemInput::validate).collect()
}

/// 请求币种，缺省为配置的默认币种
pub(crate) fn resolve_currency(
    requested: Option<&str>,
    settings: &PricingSettings,
) -> AppResult<Currency> {
    match requested {
        Some(code) => Currency::new(code).map_err(|e| AppError::validation(e.to_string())),
        None => Ok(settings.default_currency.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine() -> PricingEngine {
        PricingEngine::new(PricingSettings::default())
    }

    #[test]
    fn test_quote_request_from_json() {
        let request: QuoteRequest = serde_json::from_str(
            r#"{
                "customer": {"country": "Belgique", "customer_type": "particulier"},
                "zones": [
                    {"name": "France", "countries": ["FR"], "rate": {"rate_type": "flat", "base_price": "5"}},
                    {"name": "EU", "countries": ["BE", "DE"],
                     "rate": {"rate_type": "per_item", "base_price": "7", "per_item_price": "1.5"}},
                    {"name": "World", "countries": ["*"], "rate": {"rate_type": "flat", "base_price": "20"}}
                ],
                "items": [
                    {"title": "Head Hunters", "unit_price": "29.90", "quantity": 2},
                    {"title": "Maiden Voyage", "unit_price": "24.50", "quantity": 1}
                ]
            }"#,
        )
        .unwrap();

        let b = request.price(&engine()).unwrap();
        assert_eq!(b.subtotal_net, dec!(84.30));
        assert_eq!(b.vat_amount, dec!(16.86));
        assert_eq!(b.shipping_zone_name, "EU");
        assert_eq!(b.shipping_amount, dec!(10.00));
        assert_eq!(b.total, dec!(111.16));
        assert_eq!(b.currency.code(), "EUR");
    }

    #[test]
    fn test_shipping_method_overrides_zones() {
        let request: QuoteRequest = serde_json::from_str(
            r#"{
                "customer": {"country": "FR"},
                "shipping_method": {"name": "Colissimo", "price": "6.50"},
                "items": [{"title": "Promo", "unit_price": "10", "quantity": 1}],
                "currency": "usd"
            }"#,
        )
        .unwrap();

        let b = request.price(&engine()).unwrap();
        assert_eq!(b.shipping_zone_name, "Colissimo");
        assert_eq!(b.total, dec!(18.50));
        assert_eq!(b.currency.code(), "USD");
    }

    #[test]
    fn test_invalid_line_is_rejected() {
        let request: QuoteRequest = serde_json::from_str(
            r#"{
                "customer": {"country": "FR"},
                "shipping_method": {"name": "Colissimo", "price": "6.50"},
                "items": [{"title": "Broken", "unit_price": "10", "quantity": 0}]
            }"#,
        )
        .unwrap();

        assert!(matches!(request.price(&engine()), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_missing_fallback_zone() {
        let request: QuoteRequest = serde_json::from_str(
            r#"{
                "customer": {"country": "JP"},
                "zones": [{"name": "France", "countries": ["FR"], "rate": {"rate_type": "flat", "base_price": "5"}}],
                "items": [{"title": "Import", "unit_price": "10", "quantity": 1}]
            }"#,
        )
        .unwrap();

        let err = request.price(&engine()).unwrap_err();
        assert_eq!(err.status_code(), 412);
    }

    #[test]
    fn test_out_of_range_price_is_rejected_not_panicking() {
        let request: QuoteRequest = serde_json::from_str(
            r#"{
                "customer": {"country": "FR"},
                "shipping_method": {"name": "Colissimo", "price": "6.50"},
                "items": [{"title": "Erreur de saisie", "unit_price": "39614081257132168796771975167", "quantity": 3}]
            }"#,
        )
        .unwrap();

        let err = request.price(&engine()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("unit price must be <="));
    }
}
