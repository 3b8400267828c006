//! Country-to-rail reference data.
//!
//! Maps ISO 3166-1 alpha-2 codes to the local clearing rail, settlement
//! currency and purpose code used for cross-border payouts. Adding a country
//! is a change to [`COUNTRY_RAILS`] only.

use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CountryRail {
    pub country: &'static str,
    pub subtype: &'static str,
    pub currency: &'static str,
    pub purpose: Option<&'static str>,
}

const fn rail(
    country: &'static str,
    subtype: &'static str,
    currency: &'static str,
) -> CountryRail {
    CountryRail {
        country,
        subtype,
        currency,
        purpose: None,
    }
}

pub const SEPA: &str = "sepa";

pub const COUNTRY_RAILS: &[CountryRail] = &[
    // SEPA, IBAN-only routing
    rail("DE", SEPA, "EUR"),
    rail("FR", SEPA, "EUR"),
    rail("ES", SEPA, "EUR"),
    rail("NL", SEPA, "EUR"),
    rail("IT", SEPA, "EUR"),
    rail("AT", SEPA, "EUR"),
    rail("BE", SEPA, "EUR"),
    rail("IE", SEPA, "EUR"),
    rail("PT", SEPA, "EUR"),
    rail("FI", SEPA, "EUR"),
    rail("GR", SEPA, "EUR"),
    rail("LU", SEPA, "EUR"),
    rail("CY", SEPA, "EUR"),
    rail("MT", SEPA, "EUR"),
    rail("SK", SEPA, "EUR"),
    rail("LT", SEPA, "EUR"),
    rail("SI", SEPA, "EUR"),
    rail("EE", SEPA, "EUR"),
    rail("LV", SEPA, "EUR"),
    // National clearing systems
    rail("GB", "bacs", "GBP"),
    // CPA purpose code 250 (miscellaneous)
    CountryRail {
        country: "CA",
        subtype: "eft",
        currency: "CAD",
        purpose: Some("250"),
    },
    rail("CH", "sic", "CHF"),
    rail("PL", "pl_elixir", "PLN"),
    rail("AU", "au_becs", "AUD"),
    rail("SG", "sg_giro", "SGD"),
    rail("IN", "neft", "INR"),
    rail("JP", "zengin", "JPY"),
    rail("DK", "dk_nets", "DKK"),
    rail("NZ", "nz_becs", "NZD"),
    rail("NO", "nics", "NOK"),
    rail("HK", "chats", "HKD"),
    rail("SE", "se_bankgirot", "SEK"),
    rail("RO", "ro_sent", "RON"),
    rail("MX", "mx_ccen", "MXN"),
    rail("IL", "masav", "ILS"),
    rail("ID", "sknbi", "IDR"),
    rail("HU", "hu_ics", "HUF"),
];

static BY_COUNTRY: LazyLock<HashMap<&'static str, &'static CountryRail>> =
    LazyLock::new(|| COUNTRY_RAILS.iter().map(|r| (r.country, r)).collect());

/// Looks up the cross-border rail for an upper-case country code.
pub fn lookup(country: &str) -> Option<&'static CountryRail> {
    BY_COUNTRY.get(country).copied()
}

/// Every destination the engine can route to without the wire fallback.
pub fn supported_countries() -> Vec<&'static str> {
    let mut countries: Vec<&'static str> = std::iter::once("US")
        .chain(COUNTRY_RAILS.iter().map(|r| r.country))
        .collect();
    countries.sort_unstable();
    countries
}
