// HTTP PageAccessor - fetches pages with reqwest and queries them with scraper

use crate::document::Document;
use async_trait::async_trait;
use jobharvest_core::port::{
    AccessorError, Anchor, LoadState, NavigateOptions, PageAccessor, PageAccessorFactory,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Desktop browser user agent (job sites serve reduced pages to unknown agents)
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const DEFAULT_ACCEPT_LANGUAGE: &str = "es-CO,es;q=0.9,en;q=0.8";
const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Clone)]
pub struct HttpAccessorConfig {
    pub user_agent: String,
    pub accept_language: String,
    /// Connect timeout; per-request timeouts come from `NavigateOptions`
    pub connect_timeout: Duration,
}

impl Default for HttpAccessorConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Builds one shared HTTP client and hands out page sessions over it
pub struct HttpAccessorFactory {
    client: reqwest::Client,
}

impl HttpAccessorFactory {
    pub fn new(config: &HttpAccessorConfig) -> Result<Self, AccessorError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        let language = reqwest::header::HeaderValue::from_str(&config.accept_language)
            .map_err(|e| AccessorError::Browser(format!("invalid Accept-Language: {}", e)))?;
        headers.insert(reqwest::header::ACCEPT_LANGUAGE, language);

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| AccessorError::Browser(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// New session as its concrete type (for `load_html`)
    pub fn session(&self) -> HttpPageAccessor {
        HttpPageAccessor::new(self.client.clone())
    }
}

#[async_trait]
impl PageAccessorFactory for HttpAccessorFactory {
    async fn open(&self) -> Result<Arc<dyn PageAccessor>, AccessorError> {
        Ok(Arc::new(self.session()))
    }
}

/// Last loaded page: final URL and raw HTML
#[derive(Clone)]
struct LoadedPage {
    url: Url,
    html: Arc<str>,
}

/// One page session over static HTML
///
/// Nothing is rendered: `wait_for` checks once, and `click` follows the
/// element's `href` / `data-path` within the timeout of the last `navigate`.
pub struct HttpPageAccessor {
    client: reqwest::Client,
    current: Mutex<Option<LoadedPage>>,
    /// Milliseconds; set by every `navigate`
    load_timeout_ms: AtomicU64,
    closed: AtomicBool,
}

impl HttpPageAccessor {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            current: Mutex::new(None),
            load_timeout_ms: AtomicU64::new(millis(NavigateOptions::default().timeout)),
            closed: AtomicBool::new(false),
        }
    }

    /// Load a document without fetching it (fixtures, cached pages)
    pub fn load_html(&self, url: &str, html: impl Into<String>) -> Result<(), AccessorError> {
        self.ensure_open()?;
        let url = Url::parse(url).map_err(|e| AccessorError::navigation(url, e.to_string()))?;
        let html: String = html.into();
        self.set_current(LoadedPage {
            url,
            html: Arc::from(html),
        });
        Ok(())
    }

    /// Timeout applied to click-driven navigation
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms.load(Ordering::SeqCst))
    }

    fn ensure_open(&self) -> Result<(), AccessorError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(AccessorError::Closed)
        } else {
            Ok(())
        }
    }

    fn snapshot(&self) -> Option<LoadedPage> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_current(&self, page: LoadedPage) {
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(page);
    }

    /// Run a query against the current document
    fn query<T>(&self, f: impl FnOnce(&Document) -> Result<T, AccessorError>) -> Result<T, AccessorError> {
        self.ensure_open()?;
        let page = self.snapshot().ok_or(AccessorError::NoPage)?;
        let document = Document::parse(page.url, &page.html);
        f(&document)
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<LoadedPage, AccessorError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    format!("timed out after {}ms", timeout.as_millis())
                } else {
                    e.to_string()
                };
                AccessorError::navigation(url, reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AccessorError::navigation(url, format!("HTTP {}", status)));
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| AccessorError::navigation(url, format!("failed to read body: {}", e)))?;

        Ok(LoadedPage {
            url: final_url,
            html: Arc::from(html),
        })
    }
}

#[async_trait]
impl PageAccessor for HttpPageAccessor {
    async fn navigate(&self, url: &str, options: NavigateOptions) -> Result<(), AccessorError> {
        self.ensure_open()?;
        debug!(url, timeout_ms = millis(options.timeout), "Fetching page");
        self.load_timeout_ms.store(millis(options.timeout), Ordering::SeqCst);
        let page = self.fetch(url, options.timeout).await?;
        self.set_current(page);
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> bool {
        self.query(|doc| doc.exists(selector)).unwrap_or(false)
    }

    async fn wait_for_load(&self, _state: LoadState, _timeout: Duration) -> Result<(), AccessorError> {
        // A fetched document is complete
        self.query(|_| Ok(()))
    }

    async fn exists(&self, selector: &str) -> Result<bool, AccessorError> {
        self.query(|doc| doc.exists(selector))
    }

    async fn read_text(&self, selector: &str) -> Result<Option<String>, AccessorError> {
        self.query(|doc| doc.text(selector))
    }

    async fn read_all_text(&self, selector: &str) -> Result<Vec<String>, AccessorError> {
        self.query(|doc| doc.all_text(selector))
    }

    async fn read_all_text_within(
        &self,
        scope: &str,
        selector: &str,
    ) -> Result<Vec<String>, AccessorError> {
        self.query(|doc| doc.all_text_within(scope, selector))
    }

    async fn read_attribute(&self, selector: &str, name: &str) -> Result<Option<String>, AccessorError> {
        self.query(|doc| doc.attribute(selector, name))
    }

    async fn read_anchors(&self, selector: &str) -> Result<Vec<Anchor>, AccessorError> {
        self.query(|doc| doc.anchors(selector))
    }

    async fn click(&self, selector: &str) -> Result<(), AccessorError> {
        let target = self.query(|doc| doc.click_target(selector))?;
        debug!(selector, target = %target, "Following click target");
        self.navigate(target.as_str(), NavigateOptions::with_timeout(self.load_timeout()))
            .await
    }

    async fn current_url(&self) -> Option<String> {
        self.snapshot().map(|page| page.url.to_string())
    }

    async fn close(&self) -> Result<(), AccessorError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            warn!("Page session closed twice");
        }
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
