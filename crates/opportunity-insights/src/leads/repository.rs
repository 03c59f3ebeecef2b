use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::domain::LeadRecord;

/// Durable backing for the lead list. Implementations read and write the
/// collection as a whole; callers serialize access.
pub trait LeadStore: Send + Sync {
    /// Load every stored record in storage order. An uninitialised store is empty.
    fn load(&self) -> Result<Vec<LeadRecord>, StoreError>;
    /// Replace the stored collection.
    fn save(&self, records: &[LeadRecord]) -> Result<(), StoreError>;
}

/// Persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access lead store {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("lead store {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode leads: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("lead store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Transient failures worth one more attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

/// Process-local store, used for tests and throwaway demo runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLeadStore {
    records: Arc<Mutex<Vec<LeadRecord>>>,
}

impl InMemoryLeadStore {
    pub fn snapshot(&self) -> Vec<LeadRecord> {
        self.records
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl LeadStore for InMemoryLeadStore {
    fn load(&self) -> Result<Vec<LeadRecord>, StoreError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, records: &[LeadRecord]) -> Result<(), StoreError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))?;
        *guard = records.to_vec();
        Ok(())
    }
}
