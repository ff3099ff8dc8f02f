//! 服务错误定义

use rust_decimal::Decimal;
use sillon_errors::AppError;
use thiserror::Error;

use crate::domain::value_objects::OrderItemId;

/// 计价与对账错误
///
/// `InvalidVatNumberFormat` 与 `VatVerificationUnavailable` 只用于降级判定和日志，
/// 不会阻断下单
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error(
        "no shipping zone matches destination {destination:?}: configure a fallback shipping zone (\"*\")"
    )]
    ZoneNotFound { destination: String },

    #[error("invalid VAT number format: {0:?}")]
    InvalidVatNumberFormat(String),

    #[error("VAT verification unavailable: {0}")]
    VatVerificationUnavailable(String),

    #[error("line {title:?}: quantity must be an integer >= 1, got {quantity}")]
    NegativeOrInvalidQuantity { title: String, quantity: i64 },

    #[error("line {title:?}: unit price must be >= 0, got {unit_price}")]
    NegativeOrInvalidPrice { title: String, unit_price: Decimal },

    #[error("invalid line item: {0}")]
    InvalidLineItem(String),

    #[error("invalid discount: {0}")]
    InvalidDiscount(String),

    #[error("amount out of range: {0}")]
    AmountOutOfRange(String),

    #[error("invalid shipping configuration: {0}")]
    InvalidShippingConfiguration(String),

    #[error("order item {0} does not belong to this order")]
    UnknownOrderItem(OrderItemId),

    #[error("order item {0} appears more than once in the edit")]
    DuplicateOrderItem(OrderItemId),

    #[error("order reconciliation failed, no changes were applied: {0}")]
    ReconciliationTransactionFailed(String),
}

impl PricingError {
    /// 计算结果超出 Decimal 可表示范围
    pub fn overflow(what: &str) -> Self {
        PricingError::AmountOutOfRange(format!("{what} exceeds the supported range"))
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::ZoneNotFound { .. } | PricingError::InvalidShippingConfiguration(_) => {
                AppError::failed_precondition(err.to_string())
            }
            PricingError::VatVerificationUnavailable(_) => {
                AppError::external_service(err.to_string())
            }
            PricingError::ReconciliationTransactionFailed(_) => AppError::database(err.to_string()),
            PricingError::InvalidVatNumberFormat(_)
            | PricingError::NegativeOrInvalidQuantity { .. }
            | PricingError::NegativeOrInvalidPrice { .. }
            | PricingError::InvalidLineItem(_)
            | PricingError::InvalidDiscount(_)
            | PricingError::AmountOutOfRange(_)
            | PricingError::UnknownOrderItem(_)
            | PricingError::DuplicateOrderItem(_) => AppError::validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_not_found_is_operator_actionable() {
        let err = PricingError::ZoneNotFound {
            destination: "JP".to_string(),
        };
        let app: AppError = err.into();

        assert_eq!(app.status_code(), 412);
        assert!(app.to_string().contains("configure a fallback shipping zone"));
    }

    #[test]
    fn test_overflow_maps_to_bad_request() {
        let app: AppError = PricingError::overflow("subtotal").into();
        assert!(matches!(app, AppError::Validation(_)));
        assert!(app.to_string().contains("subtotal exceeds the supported range"));
    }

    #[test]
    fn test_line_validation_maps_to_bad_request() {
        let err = PricingError::NegativeOrInvalidQuantity {
            title: "Kind of Blue".to_string(),
            quantity: 0,
        };
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Validation(_)));
    }
}
