//! 客户类型

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 客户类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    /// 个人
    #[default]
    Particulier,
    /// 专业客户（唱片店、分销商）
    Professionnel,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Particulier => "particulier",
            CustomerType::Professionnel => "professionnel",
        }
    }

    pub fn is_professional(&self) -> bool {
        matches!(self, CustomerType::Professionnel)
    }
}

impl FromStr for CustomerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "particulier" => Ok(CustomerType::Particulier),
            "professionnel" => Ok(CustomerType::Professionnel),
            other => Err(format!("unknown customer type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        assert_eq!(
            "Professionnel".parse::<CustomerType>().unwrap(),
            CustomerType::Professionnel
        );
        assert_eq!(CustomerType::Particulier.as_str(), "particulier");
        assert!("pro".parse::<CustomerType>().is_err());
    }
}
