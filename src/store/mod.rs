//! Store client: the remote tabular backend behind a two-method capability.

use async_trait::async_trait;

use crate::models::mood::MoodEntry;

pub mod memory;
pub mod sheets;

pub use memory::MemoryStore;
pub use sheets::SheetsStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Backend rejected credentials: {0}")]
    Auth(String),

    #[error("Backend quota exceeded")]
    QuotaExceeded,

    #[error("Backend unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend error {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

/// Append-only mood storage.
///
/// `read_all` returns entries in insertion order. Implementations do no
/// batching and no retries; failures go straight back to the caller.
#[async_trait]
pub trait MoodStore: Send + Sync {
    async fn append_entry(&self, entry: &MoodEntry) -> Result<(), StoreError>;

    async fn read_all(&self) -> Result<Vec<MoodEntry>, StoreError>;

    /// Short name used in logs and the readiness probe.
    fn name(&self) -> &'static str;
}
