//! Time-boxed memoization of `MoodStore::read_all`, so dashboard refreshes
//! stay under the backend's read quota.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::models::mood::MoodEntry;
use crate::store::{MoodStore, StoreError};

pub type Snapshot = Arc<[MoodEntry]>;

pub struct MoodCache {
    store: Arc<dyn MoodStore>,
    ttl: Duration,
    snapshot: Option<Snapshot>,
    fetched_at: Option<Instant>,
}

impl MoodCache {
    pub fn new(store: Arc<dyn MoodStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            snapshot: None,
            fetched_at: None,
        }
    }

    /// Age of the memoized snapshot, if there is one.
    pub fn age(&self) -> Option<Duration> {
        self.fetched_at.map(|t| t.elapsed())
    }

    fn fresh_snapshot(&self) -> Option<Snapshot> {
        match (&self.snapshot, self.age()) {
            (Some(snapshot), Some(age)) if age < self.ttl => Some(snapshot.clone()),
            _ => None,
        }
    }

    /// Return the memoized snapshot while it is inside the freshness window,
    /// otherwise fetch a new one. Calls inside the window return the same
    /// `Arc`, whatever happened to the backend in between.
    pub async fn get(&mut self) -> Result<Snapshot, StoreError> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot);
        }
        self.refresh().await
    }

    /// Fetch from the backend unconditionally and re-memoize.
    ///
    /// If the read fails while the previous snapshot is still fresh, that
    /// snapshot is returned instead of the error.
    pub async fn refresh(&mut self) -> Result<Snapshot, StoreError> {
        match self.store.read_all().await {
            Ok(entries) => {
                let snapshot: Snapshot = entries.into();
                tracing::debug!(
                    store = self.store.name(),
                    entries = snapshot.len(),
                    "Cache refreshed"
                );
                self.snapshot = Some(snapshot.clone());
                self.fetched_at = Some(Instant::now());
                Ok(snapshot)
            }
            Err(e) => match self.fresh_snapshot() {
                Some(snapshot) => {
                    tracing::warn!(
                        error = %e,
                        store = self.store.name(),
                        "Backend read failed, serving cached snapshot"
                    );
                    Ok(snapshot)
                }
                None => Err(e),
            },
        }
    }
}
