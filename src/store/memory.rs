use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{MoodStore, StoreError};
use crate::models::mood::MoodEntry;

/// In-process store for local runs (`STORE_BACKEND=memory`) and tests.
///
/// Cloning shares the same rows. `set_offline(true)` makes every call fail
/// the way an unreachable backend would.
#[derive(Clone, Default)]
pub struct MemoryStore {
    rows: Arc<Mutex<Vec<MoodEntry>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_entries(entries: Vec<MoodEntry>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(entries)),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    #[cfg(test)]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub async fn row_count(&self) -> usize {
        self.rows.lock().await.len()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MoodStore for MemoryStore {
    async fn append_entry(&self, entry: &MoodEntry) -> Result<(), StoreError> {
        self.check_online()?;
        self.rows.lock().await.push(entry.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<MoodEntry>, StoreError> {
        self.check_online()?;
        Ok(self.rows.lock().await.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
