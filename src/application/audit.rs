use crate::domain::audit::{AuditAction, AuditLogEntry};
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Buffers audit entries for the current unit of work.
///
/// Entries are only ever appended; they reach the store through the
/// orchestrator's change set and are never edited afterwards.
#[derive(Debug, Default)]
pub struct AuditTrail {
    entries: Vec<AuditLogEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        action: AuditAction,
        run_id: Option<Uuid>,
        payout_id: Option<Uuid>,
        details: Option<Value>,
    ) -> &AuditLogEntry {
        let entry = AuditLogEntry::new(action, run_id, payout_id, details.as_ref());
        tracing::info!(
            run = %run_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            payout = %payout_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            action = %action,
            details = entry.details.as_deref().map(|d| truncate(d, 200)).unwrap_or_default(),
            "AUDIT"
        );
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[AuditLogEntry] {
        &self.entries
    }

    /// Hands over everything recorded so far, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<AuditLogEntry> {
        std::mem::take(&mut self.entries)
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Appends a UTC-timestamped line to a payout's running notes.
pub fn append_note(existing: Option<&str>, message: &str) -> String {
    append_note_at(existing, message, Utc::now())
}

pub fn append_note_at(existing: Option<&str>, message: &str, at: DateTime<Utc>) -> String {
    let note = format!("[{}] {message}", at.format("%Y-%m-%d %H:%M UTC"));
    match existing {
        Some(prior) if !prior.is_empty() => format!("{prior}\n{note}"),
        _ => note,
    }
}
