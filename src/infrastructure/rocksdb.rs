use crate::domain::audit::AuditLogEntry;
use crate::domain::event::{LiquidationEvent, Recipient};
use crate::domain::payout::{Payout, Run};
use crate::domain::ports::{AuditFilter, ChangeSet, PayoutFilter, PayoutStore};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const CF_EVENTS: &str = "events";
pub const CF_RECIPIENTS: &str = "recipients";
pub const CF_RUNS: &str = "runs";
pub const CF_PAYOUTS: &str = "payouts";
/// `(event_id, recipient_id)` -> payout id.
pub const CF_PAYOUT_KEYS: &str = "payout_keys";
/// Audit entries keyed by big-endian sequence number.
pub const CF_AUDIT: &str = "audit";
pub const CF_META: &str = "meta";

const AUDIT_SEQ_KEY: &[u8] = b"audit_seq";
const COLUMN_FAMILIES: [&str; 7] = [
    CF_EVENTS,
    CF_RECIPIENTS,
    CF_RUNS,
    CF_PAYOUTS,
    CF_PAYOUT_KEYS,
    CF_AUDIT,
    CF_META,
];

/// A persistent payout store backed by RocksDB.
///
/// Each entity lives in its own Column Family as JSON. `commit` builds a
/// single `WriteBatch` for the whole change set, so a change set is either
/// fully visible after a restart or not at all. Commits are serialized
/// through `commit_lock` to keep the uniqueness check and the audit sequence
/// consistent across clones sharing the same `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path`, creating any missing
    /// column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PayoutError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(cf, key, serde_json::to_vec(value)?)?;
        Ok(())
    }

    /// All values of a column family in key order.
    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    fn next_audit_seq(&self) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        let current = match self.db.get_pinned_cf(cf, AUDIT_SEQ_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    PayoutError::InternalError(Box::new(std::io::Error::other(
                        "corrupt audit sequence",
                    )))
                })?;
                u64::from_be_bytes(raw)
            }
            None => 0,
        };
        Ok(current + 1)
    }

    fn commit_blocking(&self, changes: ChangeSet) -> Result<()> {
        let _guard = self.commit_lock.lock().map_err(|_| {
            PayoutError::InternalError(Box::new(std::io::Error::other("commit lock poisoned")))
        })?;

        let keys_cf = self.cf(CF_PAYOUT_KEYS)?;
        let mut staged: HashMap<Vec<u8>, Uuid> = HashMap::new();
        for payout in &changes.payouts {
            let key = payout_key(&payout.event_id, &payout.recipient_id);
            let owner = match staged.get(&key) {
                Some(id) => Some(*id),
                None => match self.db.get_pinned_cf(keys_cf, &key)? {
                    Some(bytes) => Some(Uuid::from_slice(&bytes).map_err(|e| {
                        PayoutError::InternalError(Box::new(e))
                    })?),
                    None => None,
                },
            };
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

        let mut batch = WriteBatch::default();
        let runs_cf = self.cf(CF_RUNS)?;
        for run in &changes.runs {
            batch.put_cf(runs_cf, run.id.as_bytes(), serde_json::to_vec(run)?);
        }

        let payouts_cf = self.cf(CF_PAYOUTS)?;
        for payout in &changes.payouts {
            batch.put_cf(payouts_cf, payout.id.as_bytes(), serde_json::to_vec(payout)?);
        }
        for (key, id) in &staged {
            batch.put_cf(keys_cf, key, id.as_bytes());
        }

        if !changes.audit_entries.is_empty() {
            let audit_cf = self.cf(CF_AUDIT)?;
            let mut seq = self.next_audit_seq()?;
            for mut entry in changes.audit_entries {
                entry.id = Some(seq);
                batch.put_cf(audit_cf, seq.to_be_bytes(), serde_json::to_vec(&entry)?);
                seq += 1;
            }
            batch.put_cf(self.cf(CF_META)?, AUDIT_SEQ_KEY, (seq - 1).to_be_bytes());
        }

        self.db.write(batch)?;
        Ok(())
    }
}

fn payout_key(event_id: &str, recipient_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(event_id.len() + recipient_id.len() + 1);
    key.extend_from_slice(event_id.as_bytes());
    key.push(0x1f);
    key.extend_from_slice(recipient_id.as_bytes());
    key
}

#[async_trait]
impl PayoutStore for RocksDBStore {
    async fn get_event(&self, event_id: &str) -> Result<Option<LiquidationEvent>> {
        self.get_json(CF_EVENTS, event_id.as_bytes())
    }

    async fn save_event(&self, event: LiquidationEvent) -> Result<()> {
        self.put_json(CF_EVENTS, event.id.as_bytes(), &event)
    }

    async fn save_recipient(&self, recipient: Recipient) -> Result<()> {
        self.put_json(CF_RECIPIENTS, recipient.id.as_bytes(), &recipient)
    }

    async fn list_recipients(&self) -> Result<Vec<Recipient>> {
        // keys are recipient ids, so key order is id order
        self.scan(CF_RECIPIENTS)
    }

    async fn get_run(&self, run_id: Uuid) -> Result<Option<Run>> {
        self.get_json(CF_RUNS, run_id.as_bytes())
    }

    async fn list_runs(&self) -> Result<Vec<Run>> {
        let mut runs: Vec<Run> = self.scan(CF_RUNS)?;
        runs.sort_by_key(|r| r.started_at);
        Ok(runs)
    }

    async fn get_payout(&self, payout_id: Uuid) -> Result<Option<Payout>> {
        self.get_json(CF_PAYOUTS, payout_id.as_bytes())
    }

    async fn find_payouts(&self, filter: &PayoutFilter) -> Result<Vec<Payout>> {
        let mut payouts: Vec<Payout> = self
            .scan::<Payout>(CF_PAYOUTS)?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        payouts.sort_by(|a, b| {
            (&a.recipient_id, &a.event_id, a.created_at).cmp(&(&b.recipient_id, &b.event_id, b.created_at))
        });
        Ok(payouts)
    }

    async fn audit_entries(&self, filter: AuditFilter) -> Result<Vec<AuditLogEntry>> {
        Ok(self
            .scan::<AuditLogEntry>(CF_AUDIT)?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        self.commit_blocking(changes)
    }
}
