//! 增值税区域判定

use rust_decimal::Decimal;

use crate::domain::enums::{CustomerType, VatTreatment};
use crate::domain::value_objects::{CountryCode, PricingSettings, PricingWarning, VatNumber};

pub const REVERSE_CHARGE_LABEL: &str = "TVA 0% (Autoliquidation intracommunautaire)";
pub const EXPORT_LABEL: &str = "TVA 0% (Export hors UE)";

/// 标准税率标签，如 `TVA 20%`、`TVA 5.5%`
pub fn standard_label(rate_percent: Decimal) -> String {
    format!("TVA {}%", rate_percent.normalize())
}

/// 判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VatClassification {
    pub rate_percent: Decimal,
    pub label: String,
    pub treatment: VatTreatment,
    pub warnings: Vec<PricingWarning>,
}

/// 增值税区域判定器
#[derive(Debug, Clone)]
pub struct VatClassifier {
    seller_country: CountryCode,
    standard_rate_percent: Decimal,
}

impl VatClassifier {
    pub fn new(seller_country: CountryCode, standard_rate_percent: Decimal) -> Self {
        Self {
            seller_country,
            standard_rate_percent,
        }
    }

    pub fn from_settings(settings: &PricingSettings) -> Self {
        Self::new(
            settings.seller_country.clone(),
            settings.standard_vat_rate_percent,
        )
    }

    /// 判定买方适用的税率
    ///
    /// 规则按顺序匹配：
    /// 1. 与卖方同国：标准税率
    /// 2. 欧盟内、专业客户、税号格式正确且已核验：反向征收 0%
    /// 3. 其他欧盟内买方：标准税率
    /// 4. 欧盟外（含国家为空或无法识别）：出口 0%，无法识别时附带警告
    ///
    /// 从不失败；无法识别的国家和格式错误的税号以警告返回
    pub fn classify(
        &self,
        buyer_country: &str,
        customer_type: CustomerType,
        vat_number: Option<&str>,
        vat_validated: bool,
    ) -> VatClassification {
        let mut warnings = Vec::new();

        let Some(country) = CountryCode::normalize(buyer_country) else {
            warnings.push(PricingWarning::UnrecognizedCountry {
                input: buyer_country.to_string(),
            });
            return self.export(warnings);
        };
        if !country.is_known() {
            warnings.push(PricingWarning::UnrecognizedCountry {
                input: buyer_country.to_string(),
            });
        }

        if country == self.seller_country {
            return self.standard(VatTreatment::Domestic, warnings);
        }

        if !country.is_eu_vat_member() {
            return self.export(warnings);
        }

        if customer_type.is_professional() {
            let well_formed = match vat_number.map(str::trim).filter(|v| !v.is_empty()) {
                Some(raw) => match VatNumber::parse(raw) {
                    Ok(_) => true,
                    Err(_) => {
                        warnings.push(PricingWarning::InvalidVatNumberFormat {
                            input: raw.to_string(),
                        });
                        false
                    }
                },
                None => false,
            };

            if well_formed && vat_validated {
                return VatClassification {
                    rate_percent: Decimal::ZERO,
                    label: REVERSE_CHARGE_LABEL.to_string(),
                    treatment: VatTreatment::IntraCommunityReverseCharge,
                    warnings,
                };
            }
        }

        self.standard(VatTreatment::EuStandardRate, warnings)
    }

    fn standard(&self, treatment: VatTreatment, warnings: Vec<PricingWarning>) -> VatClassification {
        VatClassification {
            rate_percent: self.standard_rate_percent,
            label: standard_label(self.standard_rate_percent),
            treatment,
            warnings,
        }
    }

    fn export(&self, warnings: Vec<PricingWarning>) -> VatClassification {
        VatClassification {
            rate_percent: Decimal::ZERO,
            label: EXPORT_LABEL.to_string(),
            treatment: VatTreatment::Export,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn classifier() -> VatClassifier {
        VatClassifier::from_settings(&PricingSettings::default())
    }

    #[test]
    fn test_domestic_any_type() {
        for customer_type in [CustomerType::Particulier, CustomerType::Professionnel] {
            let c = classifier().classify("FR", customer_type, Some("FR12345678901"), true);
            assert_eq!(c.rate_percent, dec!(20));
            assert_eq!(c.label, "TVA 20%");
            assert_eq!(c.treatment, VatTreatment::Domestic);
        }
    }

    #[test]
    fn test_domestic_by_name() {
        let c = classifier().classify("france", CustomerType::Particulier, None, false);
        assert_eq!(c.treatment, VatTreatment::Domestic);
    }

    #[test]
    fn test_reverse_charge() {
        let c = classifier().classify("DE", CustomerType::Professionnel, Some("DE123456789"), true);
        assert_eq!(c.rate_percent, Decimal::ZERO);
        assert!(c.label.contains("Autoliquidation"));
        assert_eq!(c.treatment, VatTreatment::IntraCommunityReverseCharge);
        assert!(c.warnings.is_empty());
    }

    #[test]
    fn test_eu_private_buyer_pays_standard_rate() {
        let c = classifier().classify("DE", CustomerType::Particulier, Some("DE123456789"), true);
        assert_eq!(c.rate_percent, dec!(20));
        assert_eq!(c.label, "TVA 20%");
        assert_eq!(c.treatment, VatTreatment::EuStandardRate);
    }

    #[test]
    fn test_unvalidated_pro_is_never_upgraded() {
        let c = classifier().classify("BE", CustomerType::Professionnel, Some("BE0123456789"), false);
        assert_eq!(c.rate_percent, dec!(20));

        let missing = classifier().classify("BE", CustomerType::Professionnel, None, true);
        assert_eq!(missing.rate_percent, dec!(20));
    }

    #[test]
    fn test_malformed_vat_number_degrades_with_warning() {
        let c = classifier().classify("DE", CustomerType::Professionnel, Some("12-34"), true);
        assert_eq!(c.rate_percent, dec!(20));
        assert_eq!(
            c.warnings,
            vec![PricingWarning::InvalidVatNumberFormat {
                input: "12-34".to_string()
            }]
        );
    }

    #[test]
    fn test_export_any_type() {
        for customer_type in [CustomerType::Particulier, CustomerType::Professionnel] {
            let c = classifier().classify("US", customer_type, Some("US123456"), true);
            assert_eq!(c.rate_percent, Decimal::ZERO);
            assert!(c.label.contains("Export"));
        }
        let uk = classifier().classify("Royaume-Uni", CustomerType::Professionnel, None, false);
        assert_eq!(uk.treatment, VatTreatment::Export);
    }

    #[test]
    fn test_unknown_country_is_export_with_warning() {
        let c = classifier().classify("", CustomerType::Particulier, None, false);
        assert_eq!(c.rate_percent, Decimal::ZERO);
        assert!(c.label.contains("Export"));
        assert_eq!(
            c.warnings,
            vec![PricingWarning::UnrecognizedCountry { input: String::new() }]
        );
    }

    #[test]
    fn test_unknown_two_letter_code_warns() {
        let c = classifier().classify("ZZ", CustomerType::Professionnel, None, false);
        assert_eq!(c.treatment, VatTreatment::Export);
        assert_eq!(
            c.warnings,
            vec![PricingWarning::UnrecognizedCountry { input: "ZZ".to_string() }]
        );

        let uk = classifier().classify("UK", CustomerType::Particulier, None, false);
        assert_eq!(uk.treatment, VatTreatment::Export);
        assert!(uk.warnings.is_empty());
    }

    #[test]
    fn test_reduced_rate_label() {
        let c = VatClassifier::new(CountryCode::france(), dec!(5.50))
            .classify("FR", CustomerType::Particulier, None, false);
        assert_eq!(c.label, "TVA 5.5%");
    }
}
