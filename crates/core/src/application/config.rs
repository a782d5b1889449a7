// Crawl configuration

use crate::application::constants::*;
use std::time::Duration;

/// Tunables shared by every source pass
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum "next page" advances per discovery pass
    pub max_page_advances: usize,

    /// Reads of a listing page before giving up on its items
    pub max_item_read_attempts: usize,

    /// Pause between listing read attempts
    pub item_read_retry_delay: Duration,

    /// Load wait after a navigation or pagination click
    pub page_load_timeout: Duration,

    /// Bounded probe for a listing overlay; expiry means "no overlay"
    pub overlay_probe_timeout: Duration,

    /// Wait each adapter's politeness delay between detail fetches
    pub politeness_enabled: bool,

    /// Random extra delay added to each adapter's politeness delay
    pub politeness_jitter: Duration,

    /// Run sources concurrently instead of one after another
    pub concurrent_sources: bool,

    /// Upsert retries after a duplicate-key race
    pub max_conflict_retries: u32,

    /// Base pause between conflict retries (grows linearly per attempt)
    pub conflict_retry_delay: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_page_advances: MAX_PAGE_ADVANCES,
            max_item_read_attempts: MAX_ITEM_READ_ATTEMPTS,
            item_read_retry_delay: ITEM_READ_RETRY_DELAY,
            page_load_timeout: PAGE_LOAD_TIMEOUT,
            overlay_probe_timeout: OVERLAY_PROBE_TIMEOUT,
            politeness_enabled: true,
            politeness_jitter: DEFAULT_POLITENESS_JITTER,
            concurrent_sources: false,
            max_conflict_retries: MAX_CONFLICT_RETRIES,
            conflict_retry_delay: CONFLICT_RETRY_BASE_DELAY,
        }
    }
}

impl CrawlConfig {
    /// Configuration with every delay removed (tests, local fixtures)
    pub fn without_delays() -> Self {
        Self {
            item_read_retry_delay: Duration::ZERO,
            politeness_enabled: false,
            politeness_jitter: Duration::ZERO,
            conflict_retry_delay: Duration::ZERO,
            ..Default::default()
        }
    }
}
