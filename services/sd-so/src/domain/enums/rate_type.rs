//! 运费计费方式

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 运费计费方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    /// 固定价
    #[default]
    Flat,
    /// 基础价 + 每公斤价
    PerWeight,
    /// 基础价 + 每件价（首件含在基础价内）
    PerItem,
    /// 基础价 + 每公斤价 + 每件价
    Combined,
}

impl RateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateType::Flat => "flat",
            RateType::PerWeight => "per_weight",
            RateType::PerItem => "per_item",
            RateType::Combined => "combined",
        }
    }

    /// 是否使用每公斤价
    pub fn uses_weight(&self) -> bool {
        matches!(self, RateType::PerWeight | RateType::Combined)
    }

    /// 是否使用每件价
    pub fn uses_item_count(&self) -> bool {
        matches!(self, RateType::PerItem | RateType::Combined)
    }
}

impl FromStr for RateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(RateType::Flat),
            "per_weight" => Ok(RateType::PerWeight),
            "per_item" => Ok(RateType::PerItem),
            "combined" => Ok(RateType::Combined),
            other => Err(format!("unknown rate type: {other}")),
        }
    }
}
