// Source Adapters - one implementation per job site

pub mod computrabajo;
pub mod getmanfred;

pub use computrabajo::{ComputrabajoAdapter, ComputrabajoConfig};
pub use getmanfred::{GetManfredAdapter, GetManfredConfig};

use crate::application::cancel::CancelToken;
use crate::application::config::CrawlConfig;
use crate::application::frontier::Discovery;
use crate::domain::{RawPosting, SourceKind};
use crate::error::{AppError, Result};
use crate::port::PageAccessor;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Per-site crawl behavior
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Pause the orchestrator takes between detail fetches
    fn politeness_delay(&self) -> Duration;

    /// Walk the site's listing and collect unique detail links
    ///
    /// # Errors
    /// - AppError::Adapter when the listing itself cannot be loaded
    async fn discover_links(&self, page: &dyn PageAccessor, cancel: &CancelToken) -> Result<Discovery>;

    /// Load one detail page and read its fields
    ///
    /// Returns `None` when the page cannot be loaded. A field that cannot be
    /// read is `None` in the returned record.
    async fn extract_detail(&self, page: &dyn PageAccessor, link: &str) -> Option<RawPosting>;
}

/// Text of the first match; blank text and read failures are absent
pub(crate) async fn read_field(page: &dyn PageAccessor, selector: &str) -> Option<String> {
    match page.read_text(selector).await {
        Ok(text) => text.filter(|t| !t.trim().is_empty()),
        Err(e) => {
            debug!(selector, error = %e, "Field read failed");
            None
        }
    }
}

/// Texts of every match, with read failures logged and treated as empty
pub(crate) async fn read_fields(page: &dyn PageAccessor, selector: &str) -> Vec<String> {
    match page.read_all_text(selector).await {
        Ok(texts) => texts,
        Err(e) => {
            debug!(selector, error = %e, "Field list read failed");
            Vec::new()
        }
    }
}

pub(crate) async fn read_attribute(page: &dyn PageAccessor, selector: &str, name: &str) -> Option<String> {
    match page.read_attribute(selector, name).await {
        Ok(value) => value.filter(|v| !v.trim().is_empty()),
        Err(e) => {
            debug!(selector, attribute = name, error = %e, "Attribute read failed");
            None
        }
    }
}

/// Resolve a possibly site-relative `href` against `base`
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(String::from)
}

pub(crate) fn parse_base(source: SourceKind, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| AppError::Config(format!("{} url {:?}: {}", source, raw, e)))
}

/// Adapters available to the orchestrator, keyed by source
#[derive(Clone, Default)]
pub struct SourceRegistry {
    adapters: HashMap<SourceKind, Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in site using its default configuration
    pub fn with_defaults(config: &CrawlConfig) -> Result<Self> {
        Self::from_configs(config, ComputrabajoConfig::default(), GetManfredConfig::default())
    }

    pub fn from_configs(
        config: &CrawlConfig,
        computrabajo: ComputrabajoConfig,
        getmanfred: GetManfredConfig,
    ) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(ComputrabajoAdapter::new(computrabajo, config)?));
        registry.register(Arc::new(GetManfredAdapter::new(getmanfred, config)?));
        Ok(registry)
    }

    /// Add or replace the adapter for its source
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: SourceKind) -> Result<Arc<dyn SourceAdapter>> {
        self.adapters
            .get(&kind)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no adapter registered for {}", kind)))
    }

    /// Registered sources in [`SourceKind::ALL`] order
    pub fn kinds(&self) -> Vec<SourceKind> {
        SourceKind::ALL
            .into_iter()
            .filter(|kind| self.adapters.contains_key(kind))
            .collect()
    }
}
