//! 运费解析

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sillon_domain_core::round_money;

use crate::domain::entities::{LineItem, ShippingZone};
use crate::domain::value_objects::{CountryCode, ShippingZoneId};
use crate::error::PricingError;

/// 计算运费所需的购物车指标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMetrics {
    /// 折后小计（免运费门槛比较对象）
    pub subtotal_net: Decimal,
    pub total_weight_kg: Decimal,
    /// 件数（各行数量之和）
    pub item_count: u32,
}

impl CartMetrics {
    pub fn from_items(items: &[LineItem], subtotal_net: Decimal) -> Result<Self, PricingError> {
        let total_weight_kg = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| {
                item.line_weight().and_then(|w| acc.checked_add(w))
            })
            .ok_or_else(|| PricingError::overflow("total weight"))?;

        Ok(Self {
            subtotal_net,
            total_weight_kg,
            item_count: items
                .iter()
                .fold(0u32, |acc, item| acc.saturating_add(item.quantity())),
        })
    }
}

/// 运费报价
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub amount: Decimal,
    pub is_free: bool,
    pub zone_name: String,
    pub zone_id: ShippingZoneId,
}

/// 运费解析器
pub struct ShippingRateResolver;

impl ShippingRateResolver {
    /// 按区域顺序找出目的地所属区域
    ///
    /// 显式列出的国家按顺序第一个命中；都不命中时使用第一个通配区域。
    /// 无法识别的目的地只能落到通配区域
    pub fn match_zone<'z>(zones: &'z [ShippingZone], destination: &str) -> Option<&'z ShippingZone> {
        let explicit = CountryCode::normalize(destination)
            .and_then(|country| zones.iter().find(|zone| zone.covers(&country)));

        explicit.or_else(|| zones.iter().find(|zone| zone.is_wildcard()))
    }

    /// 计算运费
    pub fn resolve(
        zones: &[ShippingZone],
        destination: &str,
        cart: &CartMetrics,
    ) -> Result<ShippingQuote, PricingError> {
        let zone = Self::match_zone(zones, destination).ok_or_else(|| {
            PricingError::ZoneNotFound {
                destination: destination.to_string(),
            }
        })?;

        let (amount, is_free) = if zone.rate.is_free_for(cart.subtotal_net) {
            (round_money(Decimal::ZERO), true)
        } else {
            let cost = zone.rate.raw_cost(cart.total_weight_kg, cart.item_count)?;
            (round_money(cost), false)
        };

        Ok(ShippingQuote {
            amount,
            is_free,
            zone_name: zone.name.clone(),
            zone_id: zone.id.clone(),
        })
    }
}
