use super::event::Recipient;
use super::routing::{FxIndicator, RailDecision};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a single payout.
///
/// `Completed` and `Skipped` payouts stay with their original run and never
/// reach the provider again; `Failed` and `Pending` are picked up again.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    #[default]
    Pending,
    Eligible,
    Processing,
    Completed,
    Failed,
    Skipped,
}

impl PayoutStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Eligible => "eligible",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "eligible" => Ok(Self::Eligible),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            other => Err(format!("unknown payout status: {other}")),
        }
    }
}

/// Categorized reason a payout was not sent to the provider.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ExistingPaymentOrder,
    InvalidMethod,
    InvalidAmount,
    MissingExternalAccount,
    MissingCountry,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExistingPaymentOrder => "existing_payment_order",
            Self::InvalidMethod => "invalid_method",
            Self::InvalidAmount => "invalid_amount",
            Self::MissingExternalAccount => "missing_external_account",
            Self::MissingCountry => "missing_country",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recipient's share of one event. Unique per `(event_id, recipient_id)`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payout {
    pub id: Uuid,
    /// The run currently responsible for this payout, if any.
    pub run_id: Option<Uuid>,
    pub event_id: String,
    pub recipient_id: String,
    pub recipient_name: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub country: Option<String>,
    pub payment_method: Option<String>,
    pub has_us_bank_account: bool,
    pub external_account_id: Option<String>,

    // Routing outputs
    pub rail: Option<String>,
    pub rail_subtype: Option<String>,
    pub rail_currency: Option<String>,
    pub fx_indicator: Option<FxIndicator>,
    pub payment_order_type: Option<String>,

    // Execution outputs
    pub status: PayoutStatus,
    pub skip_reason: Option<SkipReason>,
    pub payment_order_id: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payout {
    /// Creates a pending USD payout from a recipient snapshot.
    pub fn for_recipient(run_id: Uuid, event_id: &str, recipient: &Recipient, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            run_id: Some(run_id),
            event_id: event_id.to_string(),
            recipient_id: recipient.id.clone(),
            recipient_name: Some(recipient.name.clone()),
            amount,
            currency: "USD".to_string(),
            country: recipient.country.clone(),
            payment_method: recipient.payment_method.clone(),
            has_us_bank_account: recipient.has_us_bank_account,
            external_account_id: recipient.external_account_id.clone(),
            rail: None,
            rail_subtype: None,
            rail_currency: None,
            fx_indicator: None,
            payment_order_type: None,
            status: PayoutStatus::Pending,
            skip_reason: None,
            payment_order_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_rail(&mut self, decision: &RailDecision) {
        self.rail = Some(
            decision
                .subtype
                .unwrap_or(decision.rail_type.as_str())
                .to_string(),
        );
        self.rail_subtype = decision.subtype.map(str::to_string);
        self.rail_currency = Some(decision.currency.to_string());
        self.fx_indicator = decision.fx_indicator;
        self.payment_order_type = Some(decision.label.clone());
    }

    /// Drops routing and skip outputs left behind by an earlier attempt.
    pub fn clear_attempt_outputs(&mut self) {
        self.rail = None;
        self.rail_subtype = None;
        self.rail_currency = None;
        self.fx_indicator = None;
        self.payment_order_type = None;
        self.skip_reason = None;
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Running,
    Completed,
    Failed,
}

/// One orchestrated attempt over all payouts of an event.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Run {
    pub id: Uuid,
    pub event_id: String,
    pub status: RunStatus,
    pub created_count: u32,
    pub skipped_count: u32,
    pub failed_count: u32,
    pub skip_breakdown: BTreeMap<SkipReason, u32>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Run {
    pub fn start(event_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: event_id.to_string(),
            status: RunStatus::Running,
            created_count: 0,
            skipped_count: 0,
            failed_count: 0,
            skip_breakdown: BTreeMap::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn fail(&mut self) {
        self.status = RunStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    pub fn complete(&mut self, tally: RunTally) {
        self.created_count = tally.created;
        self.skipped_count = tally.skipped;
        self.failed_count = tally.failed;
        self.skip_breakdown = tally.skip_breakdown;
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn processed(&self) -> u32 {
        self.created_count + self.skipped_count + self.failed_count
    }
}

/// Result of driving one payout through the per-payout transition.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PayoutOutcome {
    Created,
    Skipped(SkipReason),
    Failed,
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct RunTally {
    pub created: u32,
    pub skipped: u32,
    pub failed: u32,
    pub skip_breakdown: BTreeMap<SkipReason, u32>,
}

impl RunTally {
    pub fn record(&mut self, outcome: PayoutOutcome) {
        match outcome {
            PayoutOutcome::Created => self.created += 1,
            PayoutOutcome::Failed => self.failed += 1,
            PayoutOutcome::Skipped(reason) => {
                self.skipped += 1;
                *self.skip_breakdown.entry(reason).or_insert(0) += 1;
            }
        }
    }
}
