use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes runs per event within one process.
///
/// Runs for different events proceed independently; a second run for the
/// same event waits until the first has committed.
#[derive(Debug, Default, Clone)]
pub struct EventLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, event_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(event_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
