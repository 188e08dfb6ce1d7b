use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::IntoEnumIterator;

/// Currencies that remittance providers may quote a rate for.
///
/// The set is closed: record validation, the HTTP boundary and the comparison
/// entry point all consult this type rather than keeping their own lists.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[strum(serialize = "PKR")]
    Pkr,
    #[strum(serialize = "INR")]
    Inr,
    #[strum(serialize = "BDT")]
    Bdt,
    #[strum(serialize = "PHP")]
    Php,
    #[strum(serialize = "NPR")]
    Npr,
    #[strum(serialize = "LKR")]
    Lkr,
}

impl Currency {
    /// Parses a free-form code, ignoring surrounding whitespace and case.
    pub fn parse(code: &str) -> Option<Self> {
        Self::from_str(code.trim()).ok()
    }

    /// Whether `code` is exactly one of the supported uppercase codes.
    pub fn is_supported(code: &str) -> bool {
        Self::iter().any(|currency| currency.code() == code)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Pkr => "PKR",
            Currency::Inr => "INR",
            Currency::Bdt => "BDT",
            Currency::Php => "PHP",
            Currency::Npr => "NPR",
            Currency::Lkr => "LKR",
        }
    }

    /// All supported codes in declaration order.
    pub fn codes() -> Vec<&'static str> {
        Self::iter().map(|currency| currency.code()).collect()
    }
}

/// Canonical stored form of a currency code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("PKR", Some(Currency::Pkr))]
    #[case("inr", Some(Currency::Inr))]
    #[case(" bdt ", Some(Currency::Bdt))]
    #[case("Php", Some(Currency::Php))]
    #[case("USD", None)]
    #[case("", None)]
    fn parses_codes_case_insensitively(#[case] input: &str, #[case] expected: Option<Currency>) {
        assert_eq!(Currency::parse(input), expected);
    }

    #[test]
    fn supported_check_expects_normalized_codes() {
        assert!(Currency::is_supported("NPR"));
        assert!(!Currency::is_supported("npr"));
        assert!(!Currency::is_supported("EUR"));
    }

    #[test]
    fn codes_cover_the_closed_set() {
        assert_eq!(
            Currency::codes(),
            vec!["PKR", "INR", "BDT", "PHP", "NPR", "LKR"]
        );
        assert_eq!(Currency::Lkr.to_string(), "LKR");
    }

    #[test]
    fn normalizes_to_uppercase() {
        assert_eq!(normalize_code(" pkr"), "PKR");
        assert_eq!(normalize_code("usd"), "USD");
    }
}
