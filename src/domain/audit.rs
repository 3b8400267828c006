use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    RunStarted,
    RunFailed,
    RunCompleted,
    EligibilityFailed,
    RailSelected,
    PaymentCreated,
    PaymentFailedPermanent,
    PaymentFailedRetriesExhausted,
    PaymentFailedUnexpected,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RunStarted => "run_started",
            Self::RunFailed => "run_failed",
            Self::RunCompleted => "run_completed",
            Self::EligibilityFailed => "eligibility_failed",
            Self::RailSelected => "rail_selected",
            Self::PaymentCreated => "payment_created",
            Self::PaymentFailedPermanent => "payment_failed_permanent",
            Self::PaymentFailedRetriesExhausted => "payment_failed_retries_exhausted",
            Self::PaymentFailedUnexpected => "payment_failed_unexpected",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit record. Never updated or deleted once stored.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AuditLogEntry {
    /// Sequence number, assigned by the store on commit.
    pub id: Option<u64>,
    pub run_id: Option<Uuid>,
    pub payout_id: Option<Uuid>,
    pub action: AuditAction,
    /// Details as stored: serialized JSON text.
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Details read back from storage.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(untagged)]
pub enum AuditDetails {
    Structured(Value),
    /// Stored text that no longer parses as JSON, surfaced verbatim.
    Raw(String),
}

impl AuditLogEntry {
    pub fn new(
        action: AuditAction,
        run_id: Option<Uuid>,
        payout_id: Option<Uuid>,
        details: Option<&Value>,
    ) -> Self {
        Self {
            id: None,
            run_id,
            payout_id,
            action,
            details: details.map(Value::to_string),
            timestamp: Utc::now(),
        }
    }

    pub fn parsed_details(&self) -> Option<AuditDetails> {
        self.details.as_ref().map(|raw| {
            serde_json::from_str(raw)
                .map(AuditDetails::Structured)
                .unwrap_or_else(|_| AuditDetails::Raw(raw.clone()))
        })
    }
}
