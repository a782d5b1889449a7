// GetManfred adapter: single listing page, relative links

use super::{parse_base, read_attribute, read_field, read_fields, resolve_link, SourceAdapter};
use crate::application::cancel::CancelToken;
use crate::application::config::CrawlConfig;
use crate::application::constants::{GETMANFRED_NAVIGATION_TIMEOUT, GETMANFRED_POLITENESS_DELAY};
use crate::application::frontier::{Discovery, FrontierLimits, LinkFrontier, ListItem, ListingRules};
use crate::domain::normalizer::{clean_text, strip_label};
use crate::domain::{RawPosting, SourceKind, StringOrList};
use crate::error::{AppError, Result};
use crate::port::{AccessorError, LoadState, NavigateOptions, PageAccessor};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_LISTING_URL: &str = "https://www.getmanfred.com/ofertas-empleo?onlyActive=true";

const LISTING_ITEM: &str = "div.react-reveal a";

const TITLE: &str = "h1";
const COMPANY: &str = "div.kNbsot p strong";
const COMPANY_LOGO: &str = "section.gXHpR img.BQqbU";
const SALARY: &str = "div.dToAFB span.eLoTjr";
const SALARY_PREFIX: &str = "hasta";
const KEYWORDS: &str = "div.jFrtk span";
const REQUIREMENTS: &str = "div.kreSbq ul li";

#[derive(Debug, Clone)]
pub struct GetManfredConfig {
    pub listing_url: String,
    pub navigation_timeout: Duration,
}

impl Default for GetManfredConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            navigation_timeout: GETMANFRED_NAVIGATION_TIMEOUT,
        }
    }
}

pub struct GetManfredAdapter {
    config: GetManfredConfig,
    origin: Url,
    limits: FrontierLimits,
}

impl GetManfredAdapter {
    pub fn new(config: GetManfredConfig, crawl: &CrawlConfig) -> Result<Self> {
        let origin = parse_base(SourceKind::GetManfred, &config.listing_url)?;
        Ok(Self {
            config,
            origin,
            limits: FrontierLimits::from(crawl),
        })
    }
}

/// Salary text without its leading "hasta" ("up to")
fn clean_salary_prefix(raw: String) -> String {
    match strip_label(&raw, SALARY_PREFIX) {
        Some(rest) => rest.to_string(),
        None => raw.trim().to_string(),
    }
}

#[async_trait]
impl ListingRules for GetManfredAdapter {
    async fn read_items(&self, page: &dyn PageAccessor) -> std::result::Result<Vec<ListItem>, AccessorError> {
        let items = page
            .read_anchors(LISTING_ITEM)
            .await?
            .into_iter()
            .filter_map(|anchor| {
                let link = resolve_link(&self.origin, anchor.href.as_deref()?)?;
                // Cards without readable text are keyed by their link
                let title = clean_text(&anchor.text).unwrap_or_else(|| link.clone());
                Some(ListItem::new(title, link))
            })
            .collect();
        Ok(items)
    }

    fn next_page_selector(&self) -> Option<&str> {
        None
    }
}

#[async_trait]
impl SourceAdapter for GetManfredAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::GetManfred
    }

    fn politeness_delay(&self) -> Duration {
        GETMANFRED_POLITENESS_DELAY
    }

    async fn discover_links(&self, page: &dyn PageAccessor, cancel: &CancelToken) -> Result<Discovery> {
        info!(source = %self.kind(), url = %self.config.listing_url, "Starting discovery");
        LinkFrontier::new(self.limits.clone())
            .discover(page, &self.config.listing_url, self, cancel)
            .await
            .map_err(|e| AppError::adapter(self.kind().as_str(), e.to_string()))
    }

    async fn extract_detail(&self, page: &dyn PageAccessor, link: &str) -> Option<RawPosting> {
        let options = NavigateOptions {
            timeout: self.config.navigation_timeout,
            wait_until: LoadState::DomContentLoaded,
        };
        if let Err(e) = page.navigate(link, options).await {
            warn!(source = %self.kind(), link, error = %e, "Detail page not loaded");
            return None;
        }

        let company = match read_field(page, COMPANY).await {
            Some(company) => Some(company),
            None => read_attribute(page, COMPANY_LOGO, "alt").await,
        };

        let keywords = read_fields(page, KEYWORDS).await;

        Some(RawPosting {
            title: read_field(page, TITLE).await,
            company,
            location: None,
            salary: read_field(page, SALARY).await.map(clean_salary_prefix),
            keywords: (!keywords.is_empty()).then_some(StringOrList::Many(keywords)),
            requirement_lines: read_fields(page, REQUIREMENTS).await,
            languages: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::frontier::StopReason;
    use crate::port::page_accessor::mocks::{FakePage, FakeSite};

    const LIST: &str = "https://manfred.test/ofertas-empleo?onlyActive=true";

    fn adapter() -> GetManfredAdapter {
        let config = GetManfredConfig {
            listing_url: LIST.to_string(),
            ..Default::default()
        };
        GetManfredAdapter::new(config, &CrawlConfig::without_delays()).unwrap()
    }

    #[test]
    fn test_salary_prefix_removed() {
        assert_eq!(clean_salary_prefix("hasta 60.000 €".to_string()), "60.000 €");
        assert_eq!(clean_salary_prefix("Hasta 50k".to_string()), "50k");
        assert_eq!(clean_salary_prefix(" 40k ".to_string()), "40k");
    }

    #[tokio::test]
    async fn test_discover_single_page_resolves_relative_links() {
        let site = FakeSite::new().with_page(
            LIST,
            FakePage::new()
                .with_anchor(LISTING_ITEM, "Backend Rust", "/ofertas-empleo/1/backend-rust")
                .with_anchor(LISTING_ITEM, "Backend Rust", "/ofertas-empleo/7/backend-rust")
                .with_anchor(LISTING_ITEM, "", "/ofertas-empleo/2/frontend"),
        );
        let page = site.session();

        let discovery = adapter()
            .discover_links(page.as_ref(), &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(
            discovery.links,
            vec![
                "https://manfred.test/ofertas-empleo/1/backend-rust",
                "https://manfred.test/ofertas-empleo/2/frontend",
            ]
        );
        assert_eq!(discovery.pages_visited, 1);
        assert_eq!(discovery.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_extract_detail_with_logo_fallback() {
        let link = "https://manfred.test/ofertas-empleo/1/backend-rust";
        let site = FakeSite::new().with_page(
            link,
            FakePage::new()
                .with_text(TITLE, "Backend Rust")
                .with_attribute(COMPANY_LOGO, "alt", "Manfred Corp")
                .with_text(SALARY, "hasta 60.000 €")
                .with_text(KEYWORDS, "Rust")
                .with_text(KEYWORDS, "PostgreSQL")
                .with_text(REQUIREMENTS, "Experiencia con Tokio"),
        );
        let page = site.session();

        let raw = adapter().extract_detail(page.as_ref(), link).await.unwrap();

        assert_eq!(raw.title.as_deref(), Some("Backend Rust"));
        assert_eq!(raw.company.as_deref(), Some("Manfred Corp"));
        assert_eq!(raw.location, None);
        assert_eq!(raw.salary.as_deref(), Some("60.000 €"));
        assert_eq!(
            raw.keywords,
            Some(StringOrList::Many(vec!["Rust".to_string(), "PostgreSQL".to_string()]))
        );
        assert_eq!(raw.requirement_lines, vec!["Experiencia con Tokio"]);
    }

    #[tokio::test]
    async fn test_extract_detail_missing_fields_are_none() {
        let link = "https://manfred.test/ofertas-empleo/3/empty";
        let site = FakeSite::new().with_page(link, FakePage::new().with_text(TITLE, "Empty"));
        let page = site.session();

        let raw = adapter().extract_detail(page.as_ref(), link).await.unwrap();
        assert_eq!(raw.company, None);
        assert_eq!(raw.salary, None);
        assert_eq!(raw.keywords, None);
    }
}
