//! 增值税号核验接口
//!
//! 外部服务（如 VIES）的调用由应用层负责，核心只消费一个布尔结果

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::VatNumber;
use crate::error::PricingError;

/// 核验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatVerification {
    pub valid: bool,
    /// 登记的企业名称
    #[serde(default)]
    pub name: Option<String>,
}

/// 增值税号核验服务
#[async_trait]
pub trait VatVerifier: Send + Sync {
    /// 核验税号；网络错误等返回 `VatVerificationUnavailable`
    async fn verify(&self, vat_number: &VatNumber) -> Result<VatVerification, PricingError>;
}
