use super::audit::AuditLogEntry;
use super::event::{LiquidationEvent, Recipient};
use super::payout::{Payout, PayoutStatus, Run};
use super::provider::{PaymentOrderRequest, PaymentOrderResponse, ProviderError};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Query over stored payouts. Unset fields match everything.
#[derive(Debug, Default, Clone)]
pub struct PayoutFilter {
    pub event_id: Option<String>,
    pub run_id: Option<Uuid>,
    pub status: Option<PayoutStatus>,
    pub country: Option<String>,
    pub rail: Option<String>,
}

impl PayoutFilter {
    pub fn for_event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
            ..Self::default()
        }
    }

    pub fn for_run(run_id: Uuid) -> Self {
        Self {
            run_id: Some(run_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, payout: &Payout) -> bool {
        self.event_id.as_ref().is_none_or(|e| *e == payout.event_id)
            && self.run_id.is_none_or(|r| payout.run_id == Some(r))
            && self.status.is_none_or(|s| s == payout.status)
            && self
                .country
                .as_ref()
                .is_none_or(|c| payout.country.as_ref().is_some_and(|pc| pc.eq_ignore_ascii_case(c)))
            && self
                .rail
                .as_ref()
                .is_none_or(|r| payout.rail.as_ref() == Some(r))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum AuditFilter {
    Run(Uuid),
    Payout(Uuid),
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        match self {
            Self::Run(id) => entry.run_id == Some(*id),
            Self::Payout(id) => entry.payout_id == Some(*id),
        }
    }
}

/// Everything one orchestrator step writes, committed as a single unit.
#[derive(Debug, Default)]
pub struct ChangeSet {
    pub runs: Vec<Run>,
    pub payouts: Vec<Payout>,
    pub audit_entries: Vec<AuditLogEntry>,
}

/// Unit-of-work storage for events, recipients, runs, payouts and audit entries.
///
/// `commit` must be atomic: either every row in the change set is written or
/// none is. It rejects a payout whose `(event_id, recipient_id)` pair is owned
/// by a different payout id.
#[async_trait]
pub trait PayoutStore: Send + Sync {
    async fn get_event(&self, event_id: &str) -> Result<Option<LiquidationEvent>>;
    async fn save_event(&self, event: LiquidationEvent) -> Result<()>;
    async fn save_recipient(&self, recipient: Recipient) -> Result<()>;
    /// All recipients ordered by id.
    async fn list_recipients(&self) -> Result<Vec<Recipient>>;
    async fn get_run(&self, run_id: Uuid) -> Result<Option<Run>>;
    /// All runs ordered by start time.
    async fn list_runs(&self) -> Result<Vec<Run>>;
    async fn get_payout(&self, payout_id: Uuid) -> Result<Option<Payout>>;
    /// Matching payouts ordered by recipient id.
    async fn find_payouts(&self, filter: &PayoutFilter) -> Result<Vec<Payout>>;
    /// Matching audit entries in ascending sequence order.
    async fn audit_entries(&self, filter: AuditFilter) -> Result<Vec<AuditLogEntry>>;
    async fn commit(&self, changes: ChangeSet) -> Result<()>;
}

pub type PayoutStoreRef = Arc<dyn PayoutStore>;

/// External payment provider: a single capability, submitting an order.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn submit_order(
        &self,
        request: &PaymentOrderRequest,
    ) -> std::result::Result<PaymentOrderResponse, ProviderError>;
}

pub type PaymentProviderRef = Arc<dyn PaymentProvider>;
