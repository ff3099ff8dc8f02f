//! 配置到计价参数的转换

use sillon_config::{ConfigError, PricingConfig};
use sillon_domain_core::Currency;

use crate::domain::value_objects::{CountryCode, PricingSettings};

impl TryFrom<&PricingConfig> for PricingSettings {
    type Error = ConfigError;

    fn try_from(config: &PricingConfig) -> Result<Self, Self::Error> {
        let seller_country = CountryCode::normalize(&config.seller_country).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "pricing.seller_country {:?} is not a recognised country",
                config.seller_country
            ))
        })?;
        let default_currency = Currency::new(&config.default_currency)
            .map_err(|e| ConfigError::Invalid(format!("pricing.default_currency: {e}")))?;

        Ok(Self {
            seller_country,
            standard_vat_rate_percent: config.standard_vat_rate_percent,
            default_currency,
            minimum_pro_order_amount: config.minimum_pro_order_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_matches_default_settings() {
        let settings = PricingSettings::try_from(&PricingConfig::default()).unwrap();
        assert_eq!(settings, PricingSettings::default());
    }

    #[test]
    fn test_seller_country_by_code() {
        let config = PricingConfig {
            seller_country: "be".to_string(),
            standard_vat_rate_percent: dec!(21),
            ..PricingConfig::default()
        };
        let settings = PricingSettings::try_from(&config).unwrap();
        assert_eq!(settings.seller_country.as_str(), "BE");
        assert_eq!(settings.standard_vat_rate_percent, dec!(21));
    }

    #[test]
    fn test_rejects_unknown_country_and_currency() {
        let config = PricingConfig {
            seller_country: "Atlantis".to_string(),
            ..PricingConfig::default()
        };
        assert!(PricingSettings::try_from(&config).is_err());

        let config = PricingConfig {
            default_currency: "EURO".to_string(),
            ..PricingConfig::default()
        };
        assert!(PricingSettings::try_from(&config).is_err());
    }
}
