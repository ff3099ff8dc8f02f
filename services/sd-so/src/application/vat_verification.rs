//! 调用方的税号核验策略
//!
//! 单次调用有超时，失败后有限次重试；超时或出错一律按未核验处理

use std::time::Duration;

use sillon_common::{RetryConfig, with_retry, with_timeout};
use sillon_config::VatVerificationConfig;
use tracing::{info, warn};

use crate::domain::entities::Customer;
use crate::domain::services::VatVerifier;
use crate::domain::value_objects::{CountryCode, PricingWarning, VatNumber};
use crate::error::PricingError;
use crate::infrastructure::observability::record_vat_verification;

/// 核验状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VatStatus {
    /// 无需核验（非专业客户、本国、欧盟外、未填或格式错误的税号）
    NotApplicable,
    /// 核验通过
    Verified { name: Option<String> },
    /// 核验服务明确判定无效
    Rejected,
    /// 超时或服务错误
    Unavailable { reason: String },
}

impl VatStatus {
    /// 作为计价输入的核验结果
    pub fn is_validated(&self) -> bool {
        matches!(self, VatStatus::Verified { .. })
    }

    pub fn warning(&self) -> Option<PricingWarning> {
        match self {
            VatStatus::Unavailable { reason } => Some(PricingWarning::VatVerificationUnavailable {
                reason: reason.clone(),
            }),
            _ => None,
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            VatStatus::NotApplicable => "not_applicable",
            VatStatus::Verified { .. } => "verified",
            VatStatus::Rejected => "rejected",
            VatStatus::Unavailable { .. } => "unavailable",
        }
    }
}

/// 税号核验策略
#[derive(Debug, Clone)]
pub struct VatVerificationPolicy {
    timeout: Duration,
    retry: RetryConfig,
}

impl VatVerificationPolicy {
    pub fn new(timeout: Duration, retry: RetryConfig) -> Self {
        Self { timeout, retry }
    }

    pub fn from_config(config: &VatVerificationConfig) -> Self {
        let backoff = Duration::from_millis(config.initial_backoff_ms);
        Self::new(
            Duration::from_millis(config.timeout_ms),
            RetryConfig::new(config.max_attempts, backoff, backoff * 10),
        )
    }

    /// 需要外部核验的税号
    ///
    /// 只有欧盟内、非卖方国家的专业客户且税号格式正确时才值得调用
    pub fn candidate(customer: &Customer, seller_country: &CountryCode) -> Option<VatNumber> {
        if !customer.customer_type.is_professional() {
            return None;
        }
        let country = customer.country_code()?;
        if country == *seller_country || !country.is_eu_vat_member() {
            return None;
        }
        VatNumber::parse(customer.vat_number.as_deref()?).ok()
    }

    /// 核验税号，永不失败
    pub async fn verify(&self, verifier: &dyn VatVerifier, vat_number: &VatNumber) -> VatStatus {
        let timeout = self.timeout;
        let result = with_retry(&self.retry, "vat_verification", move || async move {
            match with_timeout(timeout, verifier.verify(vat_number)).await {
                Ok(result) => result,
                Err(timed_out) => Err(PricingError::VatVerificationUnavailable(
                    timed_out.to_string(),
                )),
            }
        })
        .await;

        let status = match result {
            Ok(verification) if verification.valid => VatStatus::Verified {
                name: verification.name,
            },
            Ok(_) => VatStatus::Rejected,
            Err(e) => VatStatus::Unavailable {
                reason: e.to_string(),
            },
        };

        match &status {
            VatStatus::Unavailable { reason } => warn!(
                vat_number = %vat_number,
                reason = %reason,
                "VAT verification unavailable, pricing as unverified"
            ),
            _ => info!(vat_number = %vat_number, outcome = status.outcome(), "VAT number checked"),
        }
        record_vat_verification(status.outcome());

        status
    }
}
