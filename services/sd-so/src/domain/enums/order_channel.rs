//! 下单渠道

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 下单渠道
///
/// 两个渠道共用同一个计价引擎，只在提交前的拦截规则上不同
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderChannel {
    /// 后台手工录单
    #[default]
    Manual,
    /// Pro 门户自助下单
    ProPortal,
}

impl OrderChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderChannel::Manual => "manual",
            OrderChannel::ProPortal => "pro_portal",
        }
    }

    /// 是否校验最低起订金额
    pub fn enforces_minimum_order(&self) -> bool {
        matches!(self, OrderChannel::ProPortal)
    }
}

impl FromStr for OrderChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(OrderChannel::Manual),
            "pro_portal" => Ok(OrderChannel::ProPortal),
            other => Err(format!("unknown order channel: {other}")),
        }
    }
}
