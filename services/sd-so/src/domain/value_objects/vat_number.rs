//! 增值税号值对象
//!
//! 只做语法校验：两位国家前缀 + 2 到 13 位字母数字。
//! 税号是否真实有效由外部核验服务决定

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

static VAT_NUMBER_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{2,13}$").unwrap());

/// 增值税号
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VatNumber(String);

impl VatNumber {
    /// 解析税号
    ///
    /// 去除空白并转为大写后再匹配格式，方便录入 `FR 12 345678901` 这类写法
    pub fn parse(raw: &str) -> Result<Self, PricingError> {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        if !VAT_NUMBER_FORMAT.is_match(&compact) {
            return Err(PricingError::InvalidVatNumberFormat(raw.to_string()));
        }

        Ok(Self(compact))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 国家前缀
    pub fn prefix(&self) -> &str {
        &self.0[..2]
    }
}

impl std::fmt::Display for VatNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
