//! 国家代码值对象
//!
//! 地址里的国家可能是 ISO-2 代码，也可能是法语或英语国名

use serde::{Deserialize, Serialize};

/// 运费区域中的通配符，匹配其他区域未覆盖的所有国家
pub const WILDCARD_COUNTRY: &str = "*";

/// 欧盟增值税区成员国
const EU_VAT_MEMBERS: &[&str] = &[
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "ES", "FI", "FR", "GR", "HR", "HU", "IE",
    "IT", "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK",
];

/// 国名（小写）到 ISO-2 的映射
const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("france", "FR"),
    ("allemagne", "DE"),
    ("germany", "DE"),
    ("deutschland", "DE"),
    ("belgique", "BE"),
    ("belgium", "BE"),
    ("autriche", "AT"),
    ("austria", "AT"),
    ("bulgarie", "BG"),
    ("bulgaria", "BG"),
    ("chypre", "CY"),
    ("cyprus", "CY"),
    ("tchéquie", "CZ"),
    ("tchequie", "CZ"),
    ("république tchèque", "CZ"),
    ("republique tcheque", "CZ"),
    ("czech republic", "CZ"),
    ("czechia", "CZ"),
    ("danemark", "DK"),
    ("denmark", "DK"),
    ("estonie", "EE"),
    ("estonia", "EE"),
    ("espagne", "ES"),
    ("spain", "ES"),
    ("finlande", "FI"),
    ("finland", "FI"),
    ("grèce", "GR"),
    ("grece", "GR"),
    ("greece", "GR"),
    ("croatie", "HR"),
    ("croatia", "HR"),
    ("hongrie", "HU"),
    ("hungary", "HU"),
    ("irlande", "IE"),
    ("ireland", "IE"),
    ("italie", "IT"),
    ("italy", "IT"),
    ("lituanie", "LT"),
    ("lithuania", "LT"),
    ("luxembourg", "LU"),
    ("lettonie", "LV"),
    ("latvia", "LV"),
    ("malte", "MT"),
    ("malta", "MT"),
    ("pays-bas", "NL"),
    ("pays bas", "NL"),
    ("netherlands", "NL"),
    ("the netherlands", "NL"),
    ("pologne", "PL"),
    ("poland", "PL"),
    ("portugal", "PT"),
    ("roumanie", "RO"),
    ("romania", "RO"),
    ("suède", "SE"),
    ("suede", "SE"),
    ("sweden", "SE"),
    ("slovénie", "SI"),
    ("slovenie", "SI"),
    ("slovenia", "SI"),
    ("slovaquie", "SK"),
    ("slovakia", "SK"),
    ("royaume-uni", "GB"),
    ("royaume uni", "GB"),
    ("united kingdom", "GB"),
    ("suisse", "CH"),
    ("switzerland", "CH"),
    ("norvège", "NO"),
    ("norvege", "NO"),
    ("norway", "NO"),
    ("monaco", "MC"),
    ("états-unis", "US"),
    ("etats-unis", "US"),
    ("united states", "US"),
    ("usa", "US"),
    ("canada", "CA"),
    ("japon", "JP"),
    ("japan", "JP"),
    ("australie", "AU"),
    ("australia", "AU"),
];

/// 常见的非 ISO 两位代码
const CODE_ALIASES: &[(&str, &str)] = &[("UK", "GB"), ("EL", "GR")];

/// ISO 3166-1 alpha-2 国家代码
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
    /// 规范化国家输入
    ///
    /// 两位字母按 ISO-2 代码处理（大小写不敏感，UK、EL 换成 GB、GR），否则按国名查表。
    /// 空字符串或无法识别的国名返回 `None`；两位代码不校验是否存在，见 [`Self::is_known`]
    pub fn normalize(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            let upper = trimmed.to_ascii_uppercase();
            let code = CODE_ALIASES
                .iter()
                .find(|(alias, _)| *alias == upper)
                .map_or(upper, |(_, code)| (*code).to_string());
            return Some(Self(code));
        }

        let lowered = trimmed.to_lowercase();
        COUNTRY_NAMES
            .iter()
            .find(|(name, _)| *name == lowered)
            .map(|(_, code)| Self((*code).to_string()))
    }

    pub fn france() -> Self {
        Self("FR".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 是否属于欧盟增值税区
    pub fn is_eu_vat_member(&self) -> bool {
        EU_VAT_MEMBERS.contains(&self.0.as_str())
    }

    /// 是否在已知国家范围内（欧盟成员或国名表中的国家）
    pub fn is_known(&self) -> bool {
        self.is_eu_vat_member() || COUNTRY_NAMES.iter().any(|(_, code)| *code == self.0)
    }

    /// 输入能否规范化为已知国家
    pub fn is_recognized(input: &str) -> bool {
        Self::normalize(input).is_some_and(|code| code.is_known())
    }

    /// 运费区域国家列表中的某一项是否指向本国
    pub fn matches_entry(&self, entry: &str) -> bool {
        CountryCode::normalize(entry).is_some_and(|code| code == *self)
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
