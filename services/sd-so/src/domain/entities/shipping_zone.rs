//! 运费区域与费率
//!
//! 区域按操作员维护的顺序逐个匹配，第一个命中的区域生效；
//! 通配区域（`"*"`）永远最后考虑

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::enums::RateType;
use crate::domain::value_objects::{CountryCode, ShippingZoneId, WILDCARD_COUNTRY};
use crate::error::PricingError;

/// 运费费率
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRate {
    pub rate_type: RateType,
    pub base_price: Decimal,
    /// 仅 `per_weight` / `combined` 使用
    #[serde(default)]
    pub per_kg_price: Option<Decimal>,
    /// 仅 `per_item` / `combined` 使用
    #[serde(default)]
    pub per_item_price: Option<Decimal>,
    /// 折后小计达到该金额时免运费
    #[serde(default)]
    pub free_above: Option<Decimal>,
}

impl ShippingRate {
    pub fn flat(base_price: Decimal) -> Self {
        Self {
            rate_type: RateType::Flat,
            base_price,
            per_kg_price: None,
            per_item_price: None,
            free_above: None,
        }
    }

    pub fn with_free_above(mut self, threshold: Decimal) -> Self {
        self.free_above = Some(threshold);
        self
    }

    /// 未舍入的运费
    pub fn raw_cost(
        &self,
        total_weight_kg: Decimal,
        item_count: u32,
    ) -> Result<Decimal, PricingError> {
        let per_kg = self.per_kg_price.unwrap_or(Decimal::ZERO);
        let per_item = self.per_item_price.unwrap_or(Decimal::ZERO);
        // 首件包含在基础价内
        let extra_items = Decimal::from(item_count.saturating_sub(1));

        let weight_part = || per_kg.checked_mul(total_weight_kg);
        let item_part = || per_item.checked_mul(extra_items);

        let cost = match self.rate_type {
            RateType::Flat => Some(self.base_price),
            RateType::PerWeight => weight_part().and_then(|w| self.base_price.checked_add(w)),
            RateType::PerItem => item_part().and_then(|i| self.base_price.checked_add(i)),
            RateType::Combined => weight_part()
                .and_then(|w| self.base_price.checked_add(w))
                .and_then(|c| item_part().and_then(|i| c.checked_add(i))),
        };
        cost.ok_or_else(|| PricingError::overflow("shipping cost"))
    }

    /// 折后小计是否达到免运费门槛
    pub fn is_free_for(&self, subtotal_net: Decimal) -> bool {
        self.free_above
            .is_some_and(|threshold| subtotal_net >= threshold)
    }

    fn validate(&self, zone_name: &str) -> Result<(), PricingError> {
        let prices = [
            ("base_price", Some(self.base_price)),
            ("per_kg_price", self.per_kg_price),
            ("per_item_price", self.per_item_price),
            ("free_above", self.free_above),
        ];

        for (field, value) in prices {
            if let Some(v) = value {
                if v < Decimal::ZERO {
                    return Err(PricingError::InvalidShippingConfiguration(format!(
                        "zone {zone_name:?}: {field} must be >= 0, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// 运费区域
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingZone {
    #[serde(default)]
    pub id: ShippingZoneId,
    pub name: String,
    /// ISO-2 代码或国名；单独的 `"*"` 表示其余所有国家
    pub countries: Vec<String>,
    pub rate: ShippingRate,
}

impl ShippingZone {
    pub fn new(name: impl Into<String>, countries: &[&str], rate: ShippingRate) -> Self {
        Self {
            id: ShippingZoneId::new(),
            name: name.into(),
            countries: countries.iter().map(|c| c.to_string()).collect(),
            rate,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.countries.iter().any(|c| c.trim() == WILDCARD_COUNTRY)
    }

    /// 是否显式列出该国家（不考虑通配符）
    pub fn covers(&self, country: &CountryCode) -> bool {
        self.countries.iter().any(|entry| country.matches_entry(entry))
    }
}

/// 手工录单时从固定列表选择的运输方式（如 "Colissimo" 6.50）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub name: String,
    pub price: Decimal,
}

impl ShippingMethod {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }

    /// 表示为一个全球通用的固定价区域，与区域计价走同一个解析流程
    pub fn into_zone(self) -> ShippingZone {
        ShippingZone {
            id: ShippingZoneId::new(),
            name: self.name,
            countries: vec![WILDCARD_COUNTRY.to_string()],
            rate: ShippingRate::flat(self.price),
        }
    }
}

/// 订单使用的运费来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShippingSelection {
    /// 按租户配置的区域表解析
    Zones,
    /// 操作员选定的运输方式
    Method(ShippingMethod),
}

impl ShippingSelection {
    pub fn requires_zone_table(&self) -> bool {
        matches!(self, ShippingSelection::Zones)
    }

    /// 本次计价实际使用的区域表
    pub fn zones(&self, configured: &[ShippingZone]) -> Vec<ShippingZone> {
        match self {
            ShippingSelection::Zones => configured.to_vec(),
            ShippingSelection::Method(method) => vec![method.clone().into_zone()],
        }
    }
}

/// 校验区域配置
///
/// 至多一个通配区域；每个区域至少一个国家；所有价格非负
pub fn validate_zones(zones: &[ShippingZone]) -> Result<(), PricingError> {
    let wildcard_count = zones.iter().filter(|z| z.is_wildcard()).count();
    if wildcard_count > 1 {
        return Err(PricingError::InvalidShippingConfiguration(format!(
            "at most one fallback zone (\"*\") is allowed, found {wildcard_count}"
        )));
    }

    for zone in zones {
        if zone.countries.iter().all(|c| c.trim().is_empty()) {
            return Err(PricingError::InvalidShippingConfiguration(format!(
                "zone {:?} has no countries",
                zone.name
            )));
        }
        zone.rate.validate(&zone.name)?;
    }

    Ok(())
}
