//! Rail selection.
//!
//! Priority, first match wins:
//! 1. foreign recipient holding a US-addressable account: domestic ACH (CCD)
//! 2. US recipient: domestic ACH (CCD), whatever the stated method
//! 3. country in [`country_rails::COUNTRY_RAILS`]: local cross-border rail
//! 4. anything else: international wire in USD

pub mod country_rails;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use country_rails::supported_countries;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum RailType {
    Ach,
    CrossBorder,
    Wire,
}

impl RailType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ach => "ach",
            Self::CrossBorder => "cross_border",
            Self::Wire => "wire",
        }
    }
}

impl fmt::Display for RailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source amount is fixed in USD; the destination amount floats with FX.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum FxIndicator {
    FixedToVariable,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RailDecision {
    pub rail_type: RailType,
    pub subtype: Option<&'static str>,
    pub currency: &'static str,
    pub purpose: Option<&'static str>,
    pub fx_indicator: Option<FxIndicator>,
    pub label: String,
}

impl RailDecision {
    fn domestic_ach(label: String) -> Self {
        Self {
            rail_type: RailType::Ach,
            subtype: Some("CCD"),
            currency: "USD",
            purpose: None,
            fx_indicator: None,
            label,
        }
    }

    pub fn is_cross_border(&self) -> bool {
        self.rail_type == RailType::CrossBorder
    }
}

/// Picks the rail for a payout. Total: never fails, whatever the input.
///
/// `payment_method` is advisory only; country always outranks it.
pub fn select_rail(
    country_code: Option<&str>,
    payment_method: Option<&str>,
    has_us_bank_account: bool,
) -> RailDecision {
    let country = country_code.unwrap_or_default().trim().to_ascii_uppercase();
    tracing::trace!(%country, method = ?payment_method, has_us_bank_account, "selecting rail");

    if has_us_bank_account && country != "US" {
        return RailDecision::domestic_ach(format!(
            "ACH (US) - foreign investor ({country}) with US bank"
        ));
    }

    if country == "US" {
        return RailDecision::domestic_ach("ACH (US)".to_string());
    }

    if let Some(cfg) = country_rails::lookup(&country) {
        return RailDecision {
            rail_type: RailType::CrossBorder,
            subtype: Some(cfg.subtype),
            currency: cfg.currency,
            purpose: cfg.purpose,
            fx_indicator: Some(FxIndicator::FixedToVariable),
            label: format!(
                "Cross-Border {} ({})",
                cfg.subtype.to_ascii_uppercase(),
                cfg.currency
            ),
        };
    }

    let shown = if country.is_empty() { "unknown" } else { country.as_str() };
    RailDecision {
        rail_type: RailType::Wire,
        subtype: None,
        currency: "USD",
        purpose: None,
        fx_indicator: None,
        label: format!("Wire (International) - {shown}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_is_domestic_ach_for_any_method() {
        for method in [Some("ACH"), Some("Wire"), Some("Crypto"), None] {
            let rail = select_rail(Some("US"), method, false);
            assert_eq!(rail.rail_type, RailType::Ach);
            assert_eq!(rail.subtype, Some("CCD"));
            assert_eq!(rail.currency, "USD");
            assert_eq!(rail.fx_indicator, None);
        }
    }

    #[test]
    fn test_eurozone_routes_to_sepa() {
        for country in ["DE", "FR", "ES", "NL", "IT", "LV"] {
            let rail = select_rail(Some(country), Some("ACH"), false);
            assert_eq!(rail.subtype, Some("sepa"), "{country}");
            assert_eq!(rail.currency, "EUR");
            assert_eq!(rail.fx_indicator, Some(FxIndicator::FixedToVariable));
            assert!(rail.is_cross_border());
        }
    }

    #[test]
    fn test_national_rails() {
        let gb = select_rail(Some("GB"), Some("ACH"), false);
        assert_eq!((gb.subtype, gb.currency), (Some("bacs"), "GBP"));
        assert_eq!(gb.label, "Cross-Border BACS (GBP)");

        let ca = select_rail(Some("CA"), Some("ACH"), false);
        assert_eq!(ca.purpose, Some("250"));
        assert_eq!(ca.currency, "CAD");
    }

    #[test]
    fn test_us_bank_flag_overrides_country() {
        let rail = select_rail(Some("JP"), Some("ACH"), true);
        assert_eq!(rail.rail_type, RailType::Ach);
        assert_eq!(rail.subtype, Some("CCD"));
        assert_eq!(rail.currency, "USD");
        assert!(rail.label.contains("foreign investor (JP)"));
    }

    #[test]
    fn test_us_bank_flag_on_us_recipient_is_plain_ach() {
        let rail = select_rail(Some("US"), Some("ACH"), true);
        assert_eq!(rail.label, "ACH (US)");
    }

    #[test]
    fn test_unsupported_or_missing_country_falls_back_to_wire() {
        let ae = select_rail(Some("AE"), Some("Wire"), false);
        assert_eq!(ae.rail_type, RailType::Wire);
        assert_eq!(ae.currency, "USD");
        assert_eq!(ae.subtype, None);
        assert!(ae.label.contains("AE"));

        let none = select_rail(None, None, false);
        assert_eq!(none.rail_type, RailType::Wire);
        assert!(none.label.contains("unknown"));
    }

    #[test]
    fn test_country_code_is_normalized() {
        let rail = select_rail(Some(" gb "), None, false);
        assert_eq!(rail.subtype, Some("bacs"));
    }
}
