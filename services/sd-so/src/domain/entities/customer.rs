//! 客户

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sillon_common::TenantId;

use crate::domain::enums::CustomerType;
use crate::domain::value_objects::{CountryCode, CustomerId};
use crate::error::PricingError;

/// 专业客户默认账期（天）
pub const DEFAULT_PRO_PAYMENT_TERMS_DAYS: u32 = 30;

/// 地址中与计价相关的部分
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub country: String,
    #[serde(default)]
    pub vat_number: Option<String>,
}

/// 客户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub id: CustomerId,
    #[serde(default)]
    pub tenant_id: TenantId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// 国家（ISO-2 代码或国名，原样保存）
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub vat_number: Option<String>,
    #[serde(default)]
    pub customer_type: CustomerType,
    /// 折扣率，取值 [0, 1]
    #[serde(default)]
    pub discount_rate: Option<Decimal>,
    #[serde(default)]
    pub payment_terms_days: Option<u32>,
}

impl Customer {
    pub fn new(
        tenant_id: TenantId,
        name: impl Into<String>,
        country: impl Into<String>,
        customer_type: CustomerType,
    ) -> Self {
        Self {
            id: CustomerId::new(),
            tenant_id,
            name: name.into(),
            email: None,
            country: country.into(),
            vat_number: None,
            customer_type,
            discount_rate: None,
            payment_terms_days: None,
        }
    }

    pub fn with_vat_number(mut self, vat_number: impl Into<String>) -> Self {
        self.vat_number = Some(vat_number.into());
        self
    }

    pub fn with_discount_rate(mut self, rate: Decimal) -> Self {
        self.discount_rate = Some(rate);
        self
    }

    pub fn with_payment_terms_days(mut self, days: u32) -> Self {
        self.payment_terms_days = Some(days);
        self
    }

    pub fn address(&self) -> Address {
        Address {
            country: self.country.clone(),
            vat_number: self.vat_number.clone(),
        }
    }

    pub fn country_code(&self) -> Option<CountryCode> {
        CountryCode::normalize(&self.country)
    }

    /// 有效折扣率，未设置时为 0
    pub fn discount_rate(&self) -> Decimal {
        self.discount_rate.unwrap_or(Decimal::ZERO)
    }

    /// 账期：未设置时专业客户 30 天，个人客户即付
    pub fn payment_terms_days(&self) -> u32 {
        self.payment_terms_days.unwrap_or(match self.customer_type {
            CustomerType::Professionnel => DEFAULT_PRO_PAYMENT_TERMS_DAYS,
            CustomerType::Particulier => 0,
        })
    }

    /// 校验折扣率范围
    pub fn validate(&self) -> Result<(), PricingError> {
        if let Some(rate) = self.discount_rate {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(PricingError::InvalidDiscount(format!(
                    "customer discount rate must be within [0, 1], got {rate}"
                )));
            }
        }
        Ok(())
    }
}
