//! sillon-config - 配置加载库

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use secrecy::Secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 生产环境输出 JSON 日志
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// 定价配置
///
/// 每次计价时显式传入，不作为全局状态读取
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// 卖方所在国家（名称或 ISO-2 代码）
    #[serde(default = "default_seller_country")]
    pub seller_country: String,
    /// 默认币种
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// 标准增值税率（百分比）
    #[serde(default = "default_standard_vat_rate")]
    pub standard_vat_rate_percent: Decimal,
    /// Pro 门户最低起订金额（折后、税前）
    #[serde(default = "default_minimum_pro_order")]
    pub minimum_pro_order_amount: Decimal,
}

fn default_seller_country() -> String {
    "France".to_string()
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_standard_vat_rate() -> Decimal {
    Decimal::from(20)
}

fn default_minimum_pro_order() -> Decimal {
    Decimal::from(100)
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            seller_country: default_seller_country(),
            default_currency: default_currency(),
            standard_vat_rate_percent: default_standard_vat_rate(),
            minimum_pro_order_amount: default_minimum_pro_order(),
        }
    }
}

/// 增值税号核验（外部服务）配置
#[derive(Debug, Clone, Deserialize)]
pub struct VatVerificationConfig {
    /// 单次调用超时（毫秒）
    #[serde(default = "default_vat_timeout_ms")]
    pub timeout_ms: u64,
    /// 最大尝试次数
    #[serde(default = "default_vat_max_attempts")]
    pub max_attempts: u32,
    /// 首次重试前等待（毫秒）
    #[serde(default = "default_vat_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_vat_timeout_ms() -> u64 {
    3000
}

fn default_vat_max_attempts() -> u32 {
    2
}

fn default_vat_backoff_ms() -> u64 {
    200
}

impl Default for VatVerificationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_vat_timeout_ms(),
            max_attempts: default_vat_max_attempts(),
            initial_backoff_ms: default_vat_backoff_ms(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub vat_verification: VatVerificationConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 优先级：环境变量 > `{APP_ENV}.toml` > `default.toml`。
    /// 环境变量以 `SILLON_` 为前缀，`__` 分隔层级，如 `SILLON_PRICING__DEFAULT_CURRENCY`
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let config: Self = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("SILLON_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.pricing.standard_vat_rate_percent;
        if rate < Decimal::ZERO || rate > Decimal::from(100) {
            return Err(ConfigError::Invalid(format!(
                "pricing.standard_vat_rate_percent must be within [0, 100], got {}",
                rate
            )));
        }
        if self.pricing.minimum_pro_order_amount < Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "pricing.minimum_pro_order_amount must not be negative".to_string(),
            ));
        }
        if self.vat_verification.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "vat_verification.timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}

#[cfg(test)]
mod tests;
