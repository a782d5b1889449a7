// Persistence Reconciler - idempotent upsert keyed by title

use crate::application::config::CrawlConfig;
use crate::domain::JobPosting;
use crate::error::Result;
use crate::port::{PostingStore, StoreError, UpsertOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Writes canonical postings to the store
///
/// A conflict means another writer touched the same title while the store
/// was deciding between insert and update; retrying resolves it as an update.
pub struct Reconciler {
    store: Arc<dyn PostingStore>,
    max_conflict_retries: u32,
    retry_delay: Duration,
}

impl Reconciler {
    pub fn new(store: Arc<dyn PostingStore>, config: &CrawlConfig) -> Self {
        Self {
            store,
            max_conflict_retries: config.max_conflict_retries,
            retry_delay: config.conflict_retry_delay,
        }
    }

    /// Insert or overwrite `posting`
    ///
    /// # Errors
    /// - DomainError::EmptyTitle or UntrimmedTitle before the store is touched
    /// - StoreError::Conflict once retries are exhausted
    /// - StoreError::Unavailable and other store errors immediately
    pub async fn reconcile(&self, posting: &JobPosting) -> Result<UpsertOutcome> {
        posting.validate()?;

        let mut attempt: u32 = 0;
        loop {
            match self.store.upsert_by_key(posting).await {
                Ok(outcome) => {
                    debug!(title = %posting.title, outcome = %outcome, "Posting reconciled");
                    return Ok(outcome);
                }
                Err(StoreError::Conflict(reason)) if attempt < self.max_conflict_retries => {
                    attempt += 1;
                    let delay = self.retry_delay * attempt;
                    warn!(
                        title = %posting.title,
                        attempt,
                        max_retries = self.max_conflict_retries,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Duplicate key conflict, retrying as update"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(title = %posting.title, error = %e, "Reconcile failed");
                    return Err(e.into());
                }
            }
        }
    }
}
