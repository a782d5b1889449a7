//! Link Frontier - pagination and de-duplication for one discovery pass
//!
//! A frontier is single-use: [`LinkFrontier::discover`] consumes it, so the
//! `seen_titles` / `visited_links` state can never leak into a second pass.

use crate::application::cancel::CancelToken;
use crate::application::config::CrawlConfig;
use crate::port::page_accessor::strip_fragment;
use crate::port::{AccessorError, LoadState, NavigateOptions, PageAccessor};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One entry of a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub title: String,
    pub link: String,
}

impl ListItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Per-site listing markup, supplied by a source adapter
#[async_trait]
pub trait ListingRules: Send + Sync {
    /// Runs before each listing page is read (e.g. dismiss an overlay)
    async fn prepare_page(&self, _page: &dyn PageAccessor) {}

    /// Read the `(title, link)` pairs of the current listing page
    async fn read_items(&self, page: &dyn PageAccessor) -> Result<Vec<ListItem>, AccessorError>;

    /// Selector of the "next page" affordance, `None` for single-page sites
    fn next_page_selector(&self) -> Option<&str>;
}

/// Why a discovery pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No further-page affordance (normal termination)
    Exhausted,
    /// The page-advance bound was reached
    PageLimit,
    /// Advancing to the next page failed; links collected so far are kept
    AdvanceFailed,
    Cancelled,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Exhausted => "exhausted",
            StopReason::PageLimit => "page_limit",
            StopReason::AdvanceFailed => "advance_failed",
            StopReason::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one discovery pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Unique, fragment-free links in discovery order
    pub links: Vec<String>,
    pub pages_visited: usize,
    pub stop_reason: StopReason,
}

/// Limits applied by the frontier
#[derive(Debug, Clone)]
pub struct FrontierLimits {
    pub max_page_advances: usize,
    pub max_item_read_attempts: usize,
    pub item_read_retry_delay: Duration,
    pub page_load_timeout: Duration,
}

impl From<&CrawlConfig> for FrontierLimits {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            max_page_advances: config.max_page_advances,
            max_item_read_attempts: config.max_item_read_attempts.max(1),
            item_read_retry_delay: config.item_read_retry_delay,
            page_load_timeout: config.page_load_timeout,
        }
    }
}

impl Default for FrontierLimits {
    fn default() -> Self {
        Self::from(&CrawlConfig::default())
    }
}

/// Pagination + dedup state of one crawl pass
pub struct LinkFrontier {
    limits: FrontierLimits,
    seen_titles: HashSet<String>,
    visited_links: HashSet<String>,
    links: Vec<String>,
}

impl LinkFrontier {
    pub fn new(limits: FrontierLimits) -> Self {
        Self {
            limits,
            seen_titles: HashSet::new(),
            visited_links: HashSet::new(),
            links: Vec::new(),
        }
    }

    /// Offer one listing item; returns true if its link was added
    ///
    /// A title seen before is ignored even when it points at a new URL.
    pub fn offer(&mut self, item: ListItem) -> bool {
        if !self.seen_titles.insert(item.title) {
            return false;
        }
        let link = strip_fragment(&item.link).to_string();
        if self.visited_links.insert(link.clone()) {
            self.links.push(link);
            true
        } else {
            false
        }
    }

    /// Links collected so far
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Walk the listing starting at `start_url`
    ///
    /// # Errors
    /// Only a failure to load `start_url` itself is an error; every later
    /// failure ends the pass early and keeps what was collected.
    pub async fn discover(
        mut self,
        page: &dyn PageAccessor,
        start_url: &str,
        rules: &dyn ListingRules,
        cancel: &CancelToken,
    ) -> Result<Discovery, AccessorError> {
        page.navigate(
            start_url,
            NavigateOptions::with_timeout(self.limits.page_load_timeout),
        )
        .await?;

        let mut pages_visited = 1;
        let mut advances = 0;

        let stop_reason = loop {
            rules.prepare_page(page).await;
            self.collect_page(page, rules, pages_visited).await;

            let Some(next_selector) = rules.next_page_selector() else {
                break StopReason::Exhausted;
            };

            match page.exists(next_selector).await {
                Ok(true) => {}
                Ok(false) => break StopReason::Exhausted,
                Err(e) => {
                    warn!(error = %e, "Could not look up next-page affordance");
                    break StopReason::AdvanceFailed;
                }
            }

            if advances >= self.limits.max_page_advances {
                warn!(
                    max_page_advances = self.limits.max_page_advances,
                    "Page advance limit reached, stopping discovery early"
                );
                break StopReason::PageLimit;
            }

            if cancel.is_cancelled() {
                info!(pages_visited, "Discovery cancelled");
                break StopReason::Cancelled;
            }

            if let Err(e) = self.advance(page, next_selector).await {
                warn!(error = %e, pages_visited, "Failed to advance to next page");
                break StopReason::AdvanceFailed;
            }

            advances += 1;
            pages_visited += 1;
        };

        info!(
            links = self.links.len(),
            pages_visited,
            stop_reason = ?stop_reason,
            "Discovery finished"
        );

        Ok(Discovery {
            links: self.links,
            pages_visited,
            stop_reason,
        })
    }

    /// Read the current page's items, re-reading a bounded number of times
    async fn collect_page(&mut self, page: &dyn PageAccessor, rules: &dyn ListingRules, page_no: usize) {
        for attempt in 1..=self.limits.max_item_read_attempts {
            match rules.read_items(page).await {
                Ok(items) => {
                    let found = items.len();
                    let added = items.into_iter().filter(|item| self.offer(item.clone())).count();
                    debug!(page = page_no, found, added, "Listing page read");
                    return;
                }
                Err(e) => {
                    warn!(
                        page = page_no,
                        attempt,
                        max_attempts = self.limits.max_item_read_attempts,
                        error = %e,
                        "Listing items not readable"
                    );
                    if attempt < self.limits.max_item_read_attempts {
                        tokio::time::sleep(self.limits.item_read_retry_delay).await;
                    }
                }
            }
        }
    }

    async fn advance(&self, page: &dyn PageAccessor, next_selector: &str) -> Result<(), AccessorError> {
        page.click(next_selector).await?;
        page.wait_for_load(LoadState::DomContentLoaded, self.limits.page_load_timeout)
            .await
    }
}
