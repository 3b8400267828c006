use crate::domain::audit::AuditLogEntry;
use crate::domain::event::{LiquidationEvent, Recipient};
use crate::domain::payout::{Payout, Run};
use crate::domain::ports::{AuditFilter, ChangeSet, PayoutFilter, PayoutStore};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    events: HashMap<String, LiquidationEvent>,
    recipients: BTreeMap<String, Recipient>,
    runs: HashMap<Uuid, Run>,
    payouts: HashMap<Uuid, Payout>,
    /// Uniqueness index over `(event_id, recipient_id)`.
    payout_keys: HashMap<(String, String), Uuid>,
    audit: Vec<AuditLogEntry>,
}

impl State {
    fn check_unique(&self, payouts: &[Payout]) -> Result<()> {
        let mut staged: HashMap<(&str, &str), Uuid> = HashMap::new();
        for payout in payouts {
            let key = (payout.event_id.as_str(), payout.recipient_id.as_str());
            let owner = staged.get(&key).copied().or_else(|| {
                self.payout_keys
                    .get(&(key.0.to_string(), key.1.to_string()))
                    .copied()
            });
            if let Some(owner) = owner
                && owner != payout.id
            {
                return Err(PayoutError::ConflictError(format!(
                    "payout already exists for event {} and recipient {}",
                    payout.event_id, payout.recipient_id
                )));
            }
            staged.insert(key, payout.id);
        }
        Ok(())
    }
}

/// A thread-safe in-memory payout store.
///
/// Uses `Arc<RwLock<..>>` so clones share the same state. `commit` validates
/// the whole change set under the write lock before applying any of it.
/// Ideal for tests and single-process runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryPayoutStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryPayoutStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayoutStore for InMemoryPayoutStore {
    async fn get_event(&self, event_id: &str) -> Result<Option<LiquidationEvent>> {
        let state = self.state.read().await;
        Ok(state.events.get(event_id).cloned())
    }

    async fn save_event(&self, event: LiquidationEvent) -> Result<()> {
        let mut state = self.state.write().await;
        state.events.insert(event.id.clone(), event);
        Ok(())
    }

    async fn save_recipient(&self, recipient: Recipient) -> Result<()> {
        let mut state = self.state.write().await;
        state.recipients.insert(recipient.id.clone(), recipient);
        Ok(())
    }

    async fn list_recipients(&self) -> Result<Vec<Recipient>> {
        let state = self.state.read().await;
        Ok(state.recipients.values().cloned().collect())
    }

    async fn get_run(&self, run_id: Uuid) -> Result<Option<Run>> {
        let state = self.state.read().await;
        Ok(state.runs.get(&run_id).cloned())
    }

    async fn list_runs(&self) -> Result<Vec<Run>> {
        let state = self.state.read().await;
        let mut runs: Vec<Run> = state.runs.values().cloned().collect();
        runs.sort_by_key(|r| r.started_at);
        Ok(runs)
    }

    async fn get_payout(&self, payout_id: Uuid) -> Result<Option<Payout>> {
        let state = self.state.read().await;
        Ok(state.payouts.get(&payout_id).cloned())
    }

    async fn find_payouts(&self, filter: &PayoutFilter) -> Result<Vec<Payout>> {
        let state = self.state.read().await;
        let mut payouts: Vec<Payout> = state
            .payouts
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        payouts.sort_by(|a, b| {
            (&a.recipient_id, &a.event_id, a.created_at).cmp(&(&b.recipient_id, &b.event_id, b.created_at))
        });
        Ok(payouts)
    }

    async fn audit_entries(&self, filter: AuditFilter) -> Result<Vec<AuditLogEntry>> {
        let state = self.state.read().await;
        Ok(state
            .audit
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_unique(&changes.payouts)?;

        for run in changes.runs {
            state.runs.insert(run.id, run);
        }
        for payout in changes.payouts {
            state.payout_keys.insert(
                (payout.event_id.clone(), payout.recipient_id.clone()),
                payout.id,
            );
            state.payouts.insert(payout.id, payout);
        }
        let mut next_id = state.audit.len() as u64 + 1;
        for mut entry in changes.audit_entries {
            entry.id = Some(next_id);
            next_id += 1;
            state.audit.push(entry);
        }
        Ok(())
    }
}
