use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Pending,
    Processing,
    Completed,
}

/// A liquidation event: the pool of money distributed across all recipients.
///
/// Created outside the engine and only ever read by it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LiquidationEvent {
    pub id: String,
    pub name: String,
    pub total_amount: Decimal,
    /// Effective date handed to the provider on every payment order.
    pub payout_date: Option<NaiveDate>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

impl LiquidationEvent {
    pub fn new(id: impl Into<String>, name: impl Into<String>, total_amount: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            total_amount,
            payout_date: None,
            status: EventStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn with_payout_date(mut self, date: NaiveDate) -> Self {
        self.payout_date = Some(date);
        self
    }
}

/// A recipient (investor) with the payment attributes the engine routes on.
///
/// `payment_method` stays a raw string so unsupported values such as
/// `"Crypto"` survive until the eligibility gate rejects them.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Recipient {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub payment_method: Option<String>,
    pub external_account_id: Option<String>,
    /// True when the bank account is US-addressable regardless of `country`.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub has_us_bank_account: bool,
}

impl Recipient {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            country: None,
            payment_method: None,
            external_account_id: None,
            has_us_bank_account: false,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.external_account_id = Some(account.into());
        self
    }

    pub fn with_us_bank_account(mut self) -> Self {
        self.has_us_bank_account = true;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

// Stored rows carry a JSON bool; seed files carry 0/1 as often as true/false.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawFlag>::deserialize(deserializer)?;
    let text = match raw {
        None => return Ok(false),
        Some(RawFlag::Bool(flag)) => return Ok(flag),
        Some(RawFlag::Number(0)) => return Ok(false),
        Some(RawFlag::Number(1)) => return Ok(true),
        Some(RawFlag::Number(other)) => other.to_string(),
        Some(RawFlag::Text(text)) => text,
    };
    match text.trim() {
        "" => Ok(false),
        value => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" => Ok(true),
            "0" | "false" | "no" | "n" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean flag: {other}"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flag_accepts_numeric_and_words() {
        for (raw, expected) in [("1", true), ("0", false), ("true", true), ("No", false)] {
            let json = format!(
                r#"{{"id":"INV-1","name":"A","country":null,"payment_method":null,"external_account_id":null,"has_us_bank_account":"{raw}"}}"#
            );
            let recipient: Recipient = serde_json::from_str(&json).unwrap();
            assert_eq!(recipient.has_us_bank_account, expected, "raw={raw}");
        }
    }

    #[test]
    fn test_flag_accepts_json_bool_and_number() {
        for (raw, expected) in [("true", true), ("false", false), ("1", true), ("0", false)] {
            let json = format!(
                r#"{{"id":"INV-1","name":"A","country":null,"payment_method":null,"external_account_id":null,"has_us_bank_account":{raw}}}"#
            );
            let recipient: Recipient = serde_json::from_str(&json).unwrap();
            assert_eq!(recipient.has_us_bank_account, expected, "raw={raw}");
        }
        let json = r#"{"id":"INV-1","name":"A","country":null,"payment_method":null,"external_account_id":null,"has_us_bank_account":2}"#;
        assert!(serde_json::from_str::<Recipient>(json).is_err());
    }

    #[test]
    fn test_flag_rejects_garbage() {
        let json = r#"{"id":"INV-1","name":"A","country":null,"payment_method":null,"external_account_id":null,"has_us_bank_account":"maybe"}"#;
        assert!(serde_json::from_str::<Recipient>(json).is_err());
    }

    #[test]
    fn test_recipient_json_round_trip() {
        for recipient in [
            Recipient::new("INV-050", "Maria Garcia")
                .with_country("JP")
                .with_method("ACH")
                .with_account("ext_us_002")
                .with_us_bank_account(),
            Recipient::new("INV-060", "Ghost Investor").with_country("US"),
        ] {
            let json = serde_json::to_string(&recipient).unwrap();
            let back: Recipient = serde_json::from_str(&json).unwrap();
            assert_eq!(back, recipient);
        }
    }

    #[test]
    fn test_flag_missing_or_null_is_false() {
        let json = r#"{"id":"INV-1","name":"A","country":null,"payment_method":null,"external_account_id":null,"has_us_bank_account":null}"#;
        assert!(!serde_json::from_str::<Recipient>(json).unwrap().has_us_bank_account);
        let json = r#"{"id":"INV-1","name":"A","country":null,"payment_method":null,"external_account_id":null}"#;
        assert!(!serde_json::from_str::<Recipient>(json).unwrap().has_us_bank_account);
    }

    #[test]
    fn test_event_json_round_trip() {
        let event = LiquidationEvent::new("LIQ-1", "Q4", dec!(800000.00))
            .with_payout_date(NaiveDate::from_ymd_opt(2024, 12, 15).unwrap());
        let back: LiquidationEvent =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_builder() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let event = LiquidationEvent::new("LIQ-1", "Q4", dec!(1000)).with_payout_date(date);
        assert_eq!(event.payout_date, Some(date));
        assert_eq!(event.status, EventStatus::Pending);
    }
}
