//! 订单行

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ProductId;
use crate::error::PricingError;

/// 单价上限，与 `order_items.unit_price NUMERIC(14, 4)` 一致
pub fn max_unit_price() -> Decimal {
    Decimal::new(99_999_999_999_999, 4)
}

/// 单件重量上限，与 `order_items.weight_kg NUMERIC(10, 3)` 一致
pub fn max_weight_kg() -> Decimal {
    Decimal::new(9_999_999_999, 3)
}

/// 已校验的订单行
///
/// 只能通过 [`LineItemInput::validate`] 或 [`LineItem::new`] 构造，
/// 因此计价引擎可以假设数量、单价与重量都在库表列的范围内
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    product_id: Option<ProductId>,
    title: String,
    unit_price: Decimal,
    quantity: u32,
    weight_kg: Option<Decimal>,
}

impl LineItem {
    pub fn new(
        product_id: Option<ProductId>,
        title: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
        weight_kg: Option<Decimal>,
    ) -> Result<Self, PricingError> {
        LineItemInput {
            product_id,
            title: title.into(),
            unit_price,
            quantity: i64::from(quantity),
            weight_kg,
        }
        .validate()
    }

    pub fn product_id(&self) -> Option<&ProductId> {
        self.product_id.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn weight_kg(&self) -> Option<Decimal> {
        self.weight_kg
    }

    /// 未关联商品的手工行（如导入时 SKU 未知）
    pub fn is_manual(&self) -> bool {
        self.product_id.is_none()
    }

    /// 行金额；溢出时返回 `None`
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    /// 行重量，未填重量按 0 计
    pub fn line_weight(&self) -> Option<Decimal> {
        self.weight_kg
            .unwrap_or(Decimal::ZERO)
            .checked_mul(Decimal::from(self.quantity))
    }
}

/// 未校验的订单行输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i64,
    #[serde(default)]
    pub weight_kg: Option<Decimal>,
}

impl LineItemInput {
    /// 校验并转换为 [`LineItem`]
    pub fn validate(self) -> Result<LineItem, PricingError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(PricingError::InvalidLineItem(
                "title must not be empty".to_string(),
            ));
        }

        let quantity = match u32::try_from(self.quantity) {
            Ok(q) if q >= 1 && i32::try_from(q).is_ok() => q,
            _ => {
                return Err(PricingError::NegativeOrInvalidQuantity {
                    title,
                    quantity: self.quantity,
                });
            }
        };

        if self.unit_price < Decimal::ZERO {
            return Err(PricingError::NegativeOrInvalidPrice {
                title,
                unit_price: self.unit_price,
            });
        }
        if self.unit_price > max_unit_price() {
            return Err(PricingError::AmountOutOfRange(format!(
                "line {title:?}: unit price must be <= {}, got {}",
                max_unit_price(),
                self.unit_price
            )));
        }

        if let Some(weight) = self.weight_kg {
            if weight < Decimal::ZERO {
                return Err(PricingError::InvalidLineItem(format!(
                    "line {title:?}: weight must be >= 0, got {weight}"
                )));
            }
            if weight > max_weight_kg() {
                return Err(PricingError::AmountOutOfRange(format!(
                    "line {title:?}: weight must be <= {} kg, got {weight}",
                    max_weight_kg()
                )));
            }
        }

        Ok(LineItem {
            product_id: self.product_id,
            title,
            unit_price: self.unit_price,
            quantity,
            weight_kg: self.weight_kg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(quantity: i64, unit_price: Decimal) -> LineItemInput {
        LineItemInput {
            product_id: None,
            title: "Blue Train".to_string(),
            unit_price,
            quantity,
            weight_kg: Some(dec!(0.25)),
        }
    }

    #[test]
    fn test_valid_line() {
        let line = input(3, dec!(24.90)).validate().unwrap();
        assert_eq!(line.line_total(), Some(dec!(74.70)));
        assert_eq!(line.line_weight(), Some(dec!(0.75)));
        assert!(line.is_manual());
    }

    #[test]
    fn test_reject_quantity() {
        assert!(matches!(
            input(0, dec!(10)).validate(),
            Err(PricingError::NegativeOrInvalidQuantity { quantity: 0, .. })
        ));
        assert!(matches!(
            input(-2, dec!(10)).validate(),
            Err(PricingError::NegativeOrInvalidQuantity { quantity: -2, .. })
        ));
    }

    #[test]
    fn test_reject_negative_price() {
        assert!(matches!(
            input(1, dec!(-0.01)).validate(),
            Err(PricingError::NegativeOrInvalidPrice { .. })
        ));
        // 赠品允许 0 元
        assert!(input(1, Decimal::ZERO).validate().is_ok());
    }

    #[test]
    fn test_reject_empty_title_and_negative_weight() {
        let mut empty = input(1, dec!(5));
        empty.title = "  ".to_string();
        assert!(matches!(empty.validate(), Err(PricingError::InvalidLineItem(_))));

        let mut heavy = input(1, dec!(5));
        heavy.weight_kg = Some(dec!(-1));
        assert!(heavy.validate().is_err());
    }

    #[test]
    fn test_reject_amounts_beyond_column_range() {
        assert!(input(1, max_unit_price()).validate().is_ok());
        assert!(matches!(
            input(3, Decimal::MAX / Decimal::TWO).validate(),
            Err(PricingError::AmountOutOfRange(_))
        ));

        let mut heavy = input(1, dec!(5));
        heavy.weight_kg = Some(Decimal::MAX);
        assert!(matches!(heavy.validate(), Err(PricingError::AmountOutOfRange(_))));

        assert!(matches!(
            input(i64::from(u32::MAX), dec!(5)).validate(),
            Err(PricingError::NegativeOrInvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_largest_line_does_not_overflow() {
        let line = input(i64::from(i32::MAX), max_unit_price()).validate().unwrap();
        assert!(line.line_total().is_some());
    }
}
