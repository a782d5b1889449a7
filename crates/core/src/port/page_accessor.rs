// Page Accessor Port
// Narrow capability over a rendered-page session (browser or static HTML)

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default navigation timeout (30s)
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Page load milestone to wait for after navigating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Load,
    DomContentLoaded,
}

/// Options for a single navigation
#[derive(Debug, Clone)]
pub struct NavigateOptions {
    pub timeout: Duration,
    pub wait_until: LoadState,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_NAVIGATION_TIMEOUT,
            wait_until: LoadState::Load,
        }
    }
}

impl NavigateOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

/// Text and target of one anchor element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text: String,
    pub href: Option<String>,
}

impl Anchor {
    pub fn new(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: Some(href.into()),
        }
    }
}

/// Page accessor errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessorError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("No page loaded")]
    NoPage,

    #[error("Page session closed")]
    Closed,

    #[error("Browser error: {0}")]
    Browser(String),
}

impl AccessorError {
    pub fn navigation(url: impl Into<String>, reason: impl Into<String>) -> Self {
        AccessorError::Navigation {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// One page session
///
/// Selectors are CSS selectors. Read operations return `Ok(None)` / empty
/// collections when nothing matches; `Err` is reserved for the session itself
/// misbehaving (no page, closed, invalid selector, content not ready).
#[async_trait]
pub trait PageAccessor: Send + Sync {
    /// Load `url` and wait for the requested load state
    ///
    /// # Errors
    /// - AccessorError::Navigation on network failure, HTTP error or timeout
    async fn navigate(&self, url: &str, options: NavigateOptions) -> Result<(), AccessorError>;

    /// Wait up to `timeout` for `selector` to be present
    ///
    /// Never fails: absence after the timeout is reported as `false`.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> bool;

    /// Wait for the current page to reach `state`
    async fn wait_for_load(&self, state: LoadState, timeout: Duration) -> Result<(), AccessorError>;

    /// Whether `selector` currently matches anything
    async fn exists(&self, selector: &str) -> Result<bool, AccessorError>;

    /// Text content of the first match
    async fn read_text(&self, selector: &str) -> Result<Option<String>, AccessorError>;

    /// Text content of every match, in document order
    async fn read_all_text(&self, selector: &str) -> Result<Vec<String>, AccessorError>;

    /// Text of every `selector` match inside the first `scope` match
    ///
    /// Empty when `scope` matches nothing.
    async fn read_all_text_within(
        &self,
        scope: &str,
        selector: &str,
    ) -> Result<Vec<String>, AccessorError>;

    /// Attribute value of the first match
    async fn read_attribute(
        &self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, AccessorError>;

    /// Every matching anchor with its text and resolved `href`
    async fn read_anchors(&self, selector: &str) -> Result<Vec<Anchor>, AccessorError>;

    /// Click the first match (may trigger a navigation, bounded by the
    /// timeout of the session's last `navigate`)
    async fn click(&self, selector: &str) -> Result<(), AccessorError>;

    /// URL of the currently loaded page
    async fn current_url(&self) -> Option<String>;

    /// Release the session; further calls fail with `Closed`
    async fn close(&self) -> Result<(), AccessorError>;
}

/// Acquires page sessions (one per crawl pass)
#[async_trait]
pub trait PageAccessorFactory: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn PageAccessor>, AccessorError>;
}

/// Remove the fragment component of a URL (`a#b` -> `a`)
pub fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted content of one page
    #[derive(Debug, Clone, Default)]
    pub struct FakePage {
        texts: HashMap<String, Vec<String>>,
        scoped_texts: HashMap<(String, String), Vec<String>>,
        attributes: HashMap<(String, String), String>,
        anchors: HashMap<String, Vec<Anchor>>,
        click_targets: HashMap<String, String>,
    }

    impl FakePage {
        pub fn new() -> Self {
            Self::default()
        }

        /// Append a text match for `selector`
        pub fn with_text(mut self, selector: &str, text: impl Into<String>) -> Self {
            self.texts
                .entry(selector.to_string())
                .or_default()
                .push(text.into());
            self
        }

        /// Append a text match for `selector` inside the first `scope` element
        pub fn with_scoped_text(mut self, scope: &str, selector: &str, text: impl Into<String>) -> Self {
            self.scoped_texts
                .entry((scope.to_string(), selector.to_string()))
                .or_default()
                .push(text.into());
            self
        }

        pub fn with_attribute(mut self, selector: &str, name: &str, value: impl Into<String>) -> Self {
            self.attributes
                .insert((selector.to_string(), name.to_string()), value.into());
            self
        }

        /// Append an anchor match for `selector`
        pub fn with_anchor(mut self, selector: &str, text: &str, href: &str) -> Self {
            self.anchors
                .entry(selector.to_string())
                .or_default()
                .push(Anchor::new(text, href));
            self
        }

        /// Clicking `selector` navigates to `url`
        pub fn with_click_target(mut self, selector: &str, url: &str) -> Self {
            self.click_targets
                .insert(selector.to_string(), url.to_string());
            self
        }

        /// Clicking `selector` is allowed and does nothing
        pub fn with_clickable(self, selector: &str) -> Self {
            self.with_text(selector, "")
        }

        fn has(&self, selector: &str) -> bool {
            self.texts.contains_key(selector)
                || self.scoped_texts.keys().any(|(scope, _)| scope == selector)
                || self.anchors.contains_key(selector)
                || self.click_targets.contains_key(selector)
                || self.attributes.keys().any(|(sel, _)| sel == selector)
        }
    }

    #[derive(Default)]
    struct SiteState {
        pages: HashMap<String, FakePage>,
        failing_urls: HashSet<String>,
        flaky_reads: Mutex<HashMap<String, usize>>,
        navigations: Mutex<Vec<String>>,
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    /// In-memory web site serving scripted pages
    #[derive(Clone, Default)]
    pub struct FakeSite {
        state: Arc<SiteState>,
    }

    impl FakeSite {
        pub fn new() -> Self {
            Self::default()
        }

        fn state_mut(&mut self) -> &mut SiteState {
            Arc::get_mut(&mut self.state).expect("FakeSite is configured before it is shared")
        }

        pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
            self.state_mut().pages.insert(url.to_string(), page);
            self
        }

        /// Navigating to `url` fails with a navigation error
        pub fn with_failing_url(mut self, url: &str) -> Self {
            self.state_mut().failing_urls.insert(url.to_string());
            self
        }

        /// The first `times` anchor reads on `url` fail as "not rendered yet"
        pub fn with_flaky_reads(self, url: &str, times: usize) -> Self {
            self.state
                .flaky_reads
                .lock()
                .unwrap()
                .insert(url.to_string(), times);
            self
        }

        /// Open a session directly (without going through the factory trait)
        pub fn session(&self) -> Arc<FakeBrowser> {
            self.state.opened.fetch_add(1, Ordering::SeqCst);
            Arc::new(FakeBrowser {
                state: Arc::clone(&self.state),
                current: Mutex::new(None),
                closed: AtomicBool::new(false),
            })
        }

        pub fn opened_count(&self) -> usize {
            self.state.opened.load(Ordering::SeqCst)
        }

        pub fn closed_count(&self) -> usize {
            self.state.closed.load(Ordering::SeqCst)
        }

        /// Every URL navigated to, in order
        pub fn navigations(&self) -> Vec<String> {
            self.state.navigations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageAccessorFactory for FakeSite {
        async fn open(&self) -> Result<Arc<dyn PageAccessor>, AccessorError> {
            Ok(self.session())
        }
    }

    /// Session over a [`FakeSite`]
    pub struct FakeBrowser {
        state: Arc<SiteState>,
        current: Mutex<Option<String>>,
        closed: AtomicBool,
    }

    impl FakeBrowser {
        fn ensure_open(&self) -> Result<(), AccessorError> {
            if self.closed.load(Ordering::SeqCst) {
                Err(AccessorError::Closed)
            } else {
                Ok(())
            }
        }

        fn with_page<T>(&self, f: impl FnOnce(&FakePage) -> T) -> Result<T, AccessorError> {
            self.ensure_open()?;
            let current = self.current.lock().unwrap().clone();
            let url = current.ok_or(AccessorError::NoPage)?;
            let page = self.state.pages.get(&url).ok_or(AccessorError::NoPage)?;
            Ok(f(page))
        }

        fn go(&self, url: &str) -> Result<(), AccessorError> {
            self.ensure_open()?;
            let url = strip_fragment(url).to_string();
            self.state.navigations.lock().unwrap().push(url.clone());

            if self.state.failing_urls.contains(&url) {
                return Err(AccessorError::navigation(&url, "net::ERR_CONNECTION_RESET"));
            }
            if !self.state.pages.contains_key(&url) {
                return Err(AccessorError::navigation(&url, "HTTP 404"));
            }
            *self.current.lock().unwrap() = Some(url);
            Ok(())
        }
    }

    #[async_trait]
    impl PageAccessor for FakeBrowser {
        async fn navigate(&self, url: &str, _options: NavigateOptions) -> Result<(), AccessorError> {
            self.go(url)
        }

        async fn wait_for(&self, selector: &str, _timeout: Duration) -> bool {
            self.with_page(|page| page.has(selector)).unwrap_or(false)
        }

        async fn wait_for_load(&self, _state: LoadState, _timeout: Duration) -> Result<(), AccessorError> {
            self.with_page(|_| ())
        }

        async fn exists(&self, selector: &str) -> Result<bool, AccessorError> {
            self.with_page(|page| page.has(selector))
        }

        async fn read_text(&self, selector: &str) -> Result<Option<String>, AccessorError> {
            self.with_page(|page| {
                page.texts
                    .get(selector)
                    .and_then(|texts| texts.first().cloned())
            })
        }

        async fn read_all_text(&self, selector: &str) -> Result<Vec<String>, AccessorError> {
            self.with_page(|page| page.texts.get(selector).cloned().unwrap_or_default())
        }

        async fn read_all_text_within(
            &self,
            scope: &str,
            selector: &str,
        ) -> Result<Vec<String>, AccessorError> {
            self.with_page(|page| {
                page.scoped_texts
                    .get(&(scope.to_string(), selector.to_string()))
                    .cloned()
                    .unwrap_or_default()
            })
        }

        async fn read_attribute(
            &self,
            selector: &str,
            name: &str,
        ) -> Result<Option<String>, AccessorError> {
            self.with_page(|page| {
                page.attributes
                    .get(&(selector.to_string(), name.to_string()))
                    .cloned()
            })
        }

        async fn read_anchors(&self, selector: &str) -> Result<Vec<Anchor>, AccessorError> {
            let url = self.current_url().await.ok_or(AccessorError::NoPage)?;
            {
                let mut flaky = self.state.flaky_reads.lock().unwrap();
                if let Some(remaining) = flaky.get_mut(&url) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Err(AccessorError::Timeout {
                            what: selector.to_string(),
                            timeout_ms: 0,
                        });
                    }
                }
            }
            self.with_page(|page| page.anchors.get(selector).cloned().unwrap_or_default())
        }

        async fn click(&self, selector: &str) -> Result<(), AccessorError> {
            let (target, present) = self.with_page(|page| {
                (page.click_targets.get(selector).cloned(), page.has(selector))
            })?;
            match target {
                Some(url) => self.go(&url),
                None if present => Ok(()),
                None => Err(AccessorError::ElementNotFound(selector.to_string())),
            }
        }

        async fn current_url(&self) -> Option<String> {
            self.current.lock().unwrap().clone()
        }

        async fn close(&self) -> Result<(), AccessorError> {
            if !self.closed.swap(true, Ordering::SeqCst) {
                self.state.closed.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }
}
