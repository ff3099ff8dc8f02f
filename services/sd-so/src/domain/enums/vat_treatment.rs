//! 增值税处理方式

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 增值税处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatTreatment {
    /// 卖方本国，标准税率
    Domestic,
    /// 欧盟内 B2B 反向征收，0%
    IntraCommunityReverseCharge,
    /// 欧盟内 B2C 或未核验的 B2B，仍按标准税率
    EuStandardRate,
    /// 欧盟外出口，0%
    Export,
    /// 调用方已给定税率
    Override,
}

impl VatTreatment {
    pub fn as_str(&self) -> &'static str {
        match self {
            VatTreatment::Domestic => "domestic",
            VatTreatment::IntraCommunityReverseCharge => "intra_community_reverse_charge",
            VatTreatment::EuStandardRate => "eu_standard_rate",
            VatTreatment::Export => "export",
            VatTreatment::Override => "override",
        }
    }

    /// 是否零税率
    pub fn is_zero_rated(&self) -> bool {
        matches!(
            self,
            VatTreatment::IntraCommunityReverseCharge | VatTreatment::Export
        )
    }
}

impl FromStr for VatTreatment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domestic" => Ok(VatTreatment::Domestic),
            "intra_community_reverse_charge" => Ok(VatTreatment::IntraCommunityReverseCharge),
            "eu_standard_rate" => Ok(VatTreatment::EuStandardRate),
            "export" => Ok(VatTreatment::Export),
            "override" => Ok(VatTreatment::Override),
            other => Err(format!("unknown VAT treatment: {other}")),
        }
    }
}
