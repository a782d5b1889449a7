// Posting Store Port (Interface)

use crate::domain::JobPosting;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of an upsert keyed by title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpsertOutcome {
    /// No record with this title existed
    Inserted,
    /// A record existed and every field was overwritten
    Updated,
    /// A record existed with identical values
    Unchanged,
}

impl std::fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertOutcome::Inserted => write!(f, "INSERTED"),
            UpsertOutcome::Updated => write!(f, "UPDATED"),
            UpsertOutcome::Unchanged => write!(f, "UNCHANGED"),
        }
    }
}

/// Store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Uniqueness violation from a concurrent insert of the same title
    #[error("Duplicate key conflict: {0}")]
    Conflict(String),

    /// The store cannot be reached (pool closed, IO failure, locked file)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Repository interface for JobPosting persistence
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Atomically insert or fully overwrite the record keyed by `posting.title`
    ///
    /// # Errors
    /// - StoreError::Conflict only when a race could not be resolved
    /// - StoreError::Unavailable when the store cannot be reached
    async fn upsert_by_key(&self, posting: &JobPosting) -> Result<UpsertOutcome, StoreError>;

    /// Every stored record
    async fn read_all(&self) -> Result<Vec<JobPosting>, StoreError>;

    /// Record stored under `title`
    async fn find_by_title(&self, title: &str) -> Result<Option<JobPosting>, StoreError>;

    /// Number of stored records
    async fn count(&self) -> Result<i64, StoreError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory PostingStore keyed by title
    #[derive(Default)]
    pub struct InMemoryPostingStore {
        records: Mutex<BTreeMap<String, JobPosting>>,
        pending_conflicts: AtomicUsize,
        unavailable: AtomicBool,
        upsert_calls: AtomicUsize,
    }

    impl InMemoryPostingStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// The next `times` upserts fail with `Conflict` before touching data
        pub fn inject_conflicts(&self, times: usize) {
            self.pending_conflicts.store(times, Ordering::SeqCst);
        }

        /// Every call fails with `Unavailable` while set
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        pub fn upsert_calls(&self) -> usize {
            self.upsert_calls.load(Ordering::SeqCst)
        }

        fn check_available(&self) -> Result<(), StoreError> {
            if self.unavailable.load(Ordering::SeqCst) {
                Err(StoreError::Unavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PostingStore for InMemoryPostingStore {
        async fn upsert_by_key(&self, posting: &JobPosting) -> Result<UpsertOutcome, StoreError> {
            self.upsert_calls.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;

            let injected = self
                .pending_conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if injected {
                return Err(StoreError::Conflict(format!(
                    "UNIQUE constraint failed: job_postings.title ({})",
                    posting.title
                )));
            }

            let mut records = self.records.lock().unwrap();
            let outcome = match records.get(&posting.title) {
                None => UpsertOutcome::Inserted,
                Some(existing) if existing == posting => UpsertOutcome::Unchanged,
                Some(_) => UpsertOutcome::Updated,
            };
            records.insert(posting.title.clone(), posting.clone());
            Ok(outcome)
        }

        async fn read_all(&self) -> Result<Vec<JobPosting>, StoreError> {
            self.check_available()?;
            Ok(self.records.lock().unwrap().values().cloned().collect())
        }

        async fn find_by_title(&self, title: &str) -> Result<Option<JobPosting>, StoreError> {
            self.check_available()?;
            Ok(self.records.lock().unwrap().get(title).cloned())
        }

        async fn count(&self) -> Result<i64, StoreError> {
            self.check_available()?;
            Ok(self.records.lock().unwrap().len() as i64)
        }
    }
}
