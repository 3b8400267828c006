use crate::domain::audit::{AuditDetails, AuditLogEntry};
use crate::domain::payout::{Payout, Run};
use crate::domain::ports::{AuditFilter, PayoutFilter, PayoutStoreRef};
use crate::error::Result;
use serde::Serialize;
use uuid::Uuid;

/// A run with the payouts it currently owns.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run: Run,
    pub payouts: Vec<Payout>,
}

#[derive(Debug, Serialize)]
pub struct TraceEntry {
    pub id: Option<u64>,
    pub action: String,
    pub details: Option<AuditDetails>,
    pub timestamp: String,
}

impl From<AuditLogEntry> for TraceEntry {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            action: entry.action.to_string(),
            details: entry.parsed_details(),
            timestamp: entry.timestamp.to_rfc3339(),
        }
    }
}

/// A payout and its audit trail, oldest first.
#[derive(Debug, Serialize)]
pub struct PayoutTrace {
    pub payout: Payout,
    pub audit_trail: Vec<TraceEntry>,
}

/// Read-only projections over stored runs, payouts and audit entries.
#[derive(Clone)]
pub struct PayoutQueries {
    store: PayoutStoreRef,
}

impl PayoutQueries {
    pub fn new(store: PayoutStoreRef) -> Self {
        Self { store }
    }

    pub async fn runs(&self) -> Result<Vec<Run>> {
        self.store.list_runs().await
    }

    pub async fn run_report(&self, run_id: Uuid) -> Result<Option<RunReport>> {
        let Some(run) = self.store.get_run(run_id).await? else {
            return Ok(None);
        };
        let payouts = self.store.find_payouts(&PayoutFilter::for_run(run_id)).await?;
        Ok(Some(RunReport { run, payouts }))
    }

    pub async fn payouts(&self, filter: &PayoutFilter) -> Result<Vec<Payout>> {
        self.store.find_payouts(filter).await
    }

    pub async fn trace(&self, payout_id: Uuid) -> Result<Option<PayoutTrace>> {
        let Some(payout) = self.store.get_payout(payout_id).await? else {
            return Ok(None);
        };
        let audit_trail = self
            .store
            .audit_entries(AuditFilter::Payout(payout_id))
            .await?
            .into_iter()
            .map(TraceEntry::from)
            .collect();
        Ok(Some(PayoutTrace {
            payout,
            audit_trail,
        }))
    }
}
