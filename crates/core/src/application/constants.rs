// Crawl constants (no magic values)
use std::time::Duration;

/// Upper bound on "next page" advances in one discovery pass
pub const MAX_PAGE_ADVANCES: usize = 50;

/// Reads of one listing page before moving on to pagination
pub const MAX_ITEM_READ_ATTEMPTS: usize = 2;

/// Pause before re-reading a listing page whose items were not ready (500ms)
pub const ITEM_READ_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Wait for a page to finish loading after a navigation or click (30s)
pub const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded probe for a transient overlay such as a subscription prompt (5s)
pub const OVERLAY_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between Computrabajo detail fetches (2s)
pub const COMPUTRABAJO_POLITENESS_DELAY: Duration = Duration::from_secs(2);

/// Delay between GetManfred detail fetches (4s)
pub const GETMANFRED_POLITENESS_DELAY: Duration = Duration::from_secs(4);

/// GetManfred detail pages are slow to respond (60s)
pub const GETMANFRED_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Retries of an upsert that lost a uniqueness race
pub const MAX_CONFLICT_RETRIES: u32 = 3;

/// Base delay between conflict retries, multiplied by the attempt number (50ms)
pub const CONFLICT_RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

/// Random extra politeness delay added per detail fetch (up to 500ms)
pub const DEFAULT_POLITENESS_JITTER: Duration = Duration::from_millis(500);
