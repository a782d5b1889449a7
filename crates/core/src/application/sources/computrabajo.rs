// Computrabajo adapter: paginated listing, fixed detail layout

use super::{parse_base, read_field, read_fields, SourceAdapter};
use crate::application::cancel::CancelToken;
use crate::application::config::CrawlConfig;
use crate::application::constants::COMPUTRABAJO_POLITENESS_DELAY;
use crate::application::frontier::{Discovery, FrontierLimits, LinkFrontier, ListItem, ListingRules};
use crate::domain::normalizer::clean_text;
use crate::domain::{PublicationWindow, RawPosting, SourceKind, StringOrList};
use crate::error::{AppError, Result};
use crate::port::{AccessorError, NavigateOptions, PageAccessor};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://co.computrabajo.com";
pub const DEFAULT_KEYWORD: &str = "web developer";

const LISTING_ITEM: &str = "article.box_offer h2 a";
const NEXT_PAGE: &str = r#"div.tj_fx span.buildLink[title="Siguiente"]"#;
const OVERLAY: &str = "#pop-up-webpush-sub";
const OVERLAY_CLOSE: &str = r#"#pop-up-webpush-sub button[onclick="webpush_subscribe_ko(event);"]"#;

const TITLE: &str = "h1";
const COMPANY: &str = "div.info_company a.fs16.js-o-link";
const COMPANY_FALLBACK: &str = "div.container p.fs16";
/// Location is the last line of the first summary box
const LOCATION_BOX: &str = "div.box_resume div.box_border";
const LOCATION_LINE: &str = "p.fs16";
const SALARY: &str = "div.mbB span.mb10";
const KEYWORDS: &str = "div.pb40 p.fc_aux";
const KEYWORDS_LABEL: &str = "Palabras clave:";
const REQUIREMENTS: &str = "div.mb40 ul.mbB li";

#[derive(Debug, Clone)]
pub struct ComputrabajoConfig {
    pub base_url: String,
    pub keyword: String,
    pub window: PublicationWindow,
}

impl Default for ComputrabajoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            keyword: DEFAULT_KEYWORD.to_string(),
            window: PublicationWindow::default(),
        }
    }
}

pub struct ComputrabajoAdapter {
    config: ComputrabajoConfig,
    limits: FrontierLimits,
    navigation_timeout: Duration,
    overlay_probe_timeout: Duration,
}

impl ComputrabajoAdapter {
    pub fn new(config: ComputrabajoConfig, crawl: &CrawlConfig) -> Result<Self> {
        parse_base(SourceKind::Computrabajo, &config.base_url)?;
        if config.keyword.trim().is_empty() {
            return Err(AppError::Config("computrabajo keyword is empty".to_string()));
        }
        Ok(Self {
            config,
            limits: FrontierLimits::from(crawl),
            navigation_timeout: crawl.page_load_timeout,
            overlay_probe_timeout: crawl.overlay_probe_timeout,
        })
    }

    /// `{base}/trabajo-de-{keyword}?pubdate={window}`
    pub fn listing_url(&self) -> String {
        // form encoding turns spaces into '+' and escapes literal '+' as %2B
        let keyword: String =
            url::form_urlencoded::byte_serialize(self.config.keyword.trim().as_bytes()).collect();
        format!(
            "{}/trabajo-de-{}?pubdate={}",
            self.config.base_url.trim_end_matches('/'),
            keyword.replace('+', "%20"),
            self.config.window.query_value()
        )
    }
}

#[async_trait]
impl ListingRules for ComputrabajoAdapter {
    async fn prepare_page(&self, page: &dyn PageAccessor) {
        if !page.wait_for(OVERLAY, self.overlay_probe_timeout).await {
            debug!("Subscription overlay absent");
            return;
        }
        match page.click(OVERLAY_CLOSE).await {
            Ok(()) => debug!("Subscription overlay dismissed"),
            Err(e) => warn!(error = %e, "Could not dismiss subscription overlay"),
        }
    }

    async fn read_items(&self, page: &dyn PageAccessor) -> std::result::Result<Vec<ListItem>, AccessorError> {
        let base = page.current_url().await.and_then(|u| Url::parse(&u).ok());
        let items = page
            .read_anchors(LISTING_ITEM)
            .await?
            .into_iter()
            .filter_map(|anchor| {
                let title = clean_text(&anchor.text)?;
                let href = anchor.href?;
                let link = match &base {
                    Some(base) => super::resolve_link(base, &href)?,
                    None => href,
                };
                Some(ListItem::new(title, link))
            })
            .collect();
        Ok(items)
    }

    fn next_page_selector(&self) -> Option<&str> {
        Some(NEXT_PAGE)
    }
}

#[async_trait]
impl SourceAdapter for ComputrabajoAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Computrabajo
    }

    fn politeness_delay(&self) -> Duration {
        COMPUTRABAJO_POLITENESS_DELAY
    }

    async fn discover_links(&self, page: &dyn PageAccessor, cancel: &CancelToken) -> Result<Discovery> {
        let url = self.listing_url();
        info!(source = %self.kind(), url = %url, "Starting discovery");
        LinkFrontier::new(self.limits.clone())
            .discover(page, &url, self, cancel)
            .await
            .map_err(|e| AppError::adapter(self.kind().as_str(), e.to_string()))
    }

    async fn extract_detail(&self, page: &dyn PageAccessor, link: &str) -> Option<RawPosting> {
        if let Err(e) = page
            .navigate(link, NavigateOptions::with_timeout(self.navigation_timeout))
            .await
        {
            warn!(source = %self.kind(), link, error = %e, "Detail page not loaded");
            return None;
        }

        let company = match read_field(page, COMPANY).await {
            Some(company) => Some(company),
            None => read_field(page, COMPANY_FALLBACK).await,
        };

        // The label may follow other text in the same paragraph
        let keywords = read_field(page, KEYWORDS)
            .await
            .and_then(|text| text.find(KEYWORDS_LABEL).map(|at| text[at..].to_string()))
            .map(StringOrList::One);

        let location = match page.read_all_text_within(LOCATION_BOX, LOCATION_LINE).await {
            Ok(mut lines) => lines.pop().filter(|line| !line.trim().is_empty()),
            Err(e) => {
                debug!(selector = LOCATION_BOX, error = %e, "Field read failed");
                None
            }
        };

        Some(RawPosting {
            title: read_field(page, TITLE).await,
            company,
            location,
            salary: read_field(page, SALARY).await,
            keywords,
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

    const LIST: &str = "https://ct.test/trabajo-de-rust?pubdate=1";

    fn adapter() -> ComputrabajoAdapter {
        let config = ComputrabajoConfig {
            base_url: "https://ct.test/".to_string(),
            keyword: "rust".to_string(),
            window: PublicationWindow::Today,
        };
        ComputrabajoAdapter::new(config, &CrawlConfig::without_delays()).unwrap()
    }

    #[test]
    fn test_listing_url_encodes_keyword() {
        let adapter = ComputrabajoAdapter::new(
            ComputrabajoConfig {
                window: PublicationWindow::LastWeek,
                ..Default::default()
            },
            &CrawlConfig::default(),
        )
        .unwrap();
        assert_eq!(
            adapter.listing_url(),
            "https://co.computrabajo.com/trabajo-de-web%20developer?pubdate=7"
        );
    }

    #[test]
    fn test_rejects_bad_config() {
        let bad_url = ComputrabajoConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(ComputrabajoAdapter::new(bad_url, &CrawlConfig::default()).is_err());

        let no_keyword = ComputrabajoConfig {
            keyword: "  ".to_string(),
            ..Default::default()
        };
        assert!(ComputrabajoAdapter::new(no_keyword, &CrawlConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_discover_walks_pages_and_dismisses_overlay() {
        let site = FakeSite::new()
            .with_page(
                LIST,
                FakePage::new()
                    .with_clickable(OVERLAY)
                    .with_clickable(OVERLAY_CLOSE)
                    .with_anchor(LISTING_ITEM, "Rust Dev", "/oferta/1#lc=a")
                    .with_anchor(LISTING_ITEM, "Go Dev", "/oferta/2")
                    .with_click_target(NEXT_PAGE, "https://ct.test/trabajo-de-rust?pubdate=1&p=2"),
            )
            .with_page(
                "https://ct.test/trabajo-de-rust?pubdate=1&p=2",
                FakePage::new()
                    .with_anchor(LISTING_ITEM, "Rust Dev", "/oferta/9")
                    .with_anchor(LISTING_ITEM, "QA", "/oferta/3"),
            );
        let page = site.session();

        let discovery = adapter()
            .discover_links(page.as_ref(), &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(
            discovery.links,
            vec![
                "https://ct.test/oferta/1",
                "https://ct.test/oferta/2",
                "https://ct.test/oferta/3",
            ]
        );
        assert_eq!(discovery.pages_visited, 2);
        assert_eq!(discovery.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_discover_fails_when_listing_unreachable() {
        let site = FakeSite::new().with_failing_url(LIST);
        let page = site.session();

        let result = adapter().discover_links(page.as_ref(), &CancelToken::never()).await;
        assert!(matches!(result, Err(AppError::Adapter { .. })));
    }

    #[tokio::test]
    async fn test_extract_detail_reads_fields() {
        let link = "https://ct.test/oferta/1";
        let site = FakeSite::new().with_page(
            link,
            FakePage::new()
                .with_text(TITLE, " Desarrollador Rust ")
                .with_text(COMPANY_FALLBACK, "ACME")
                .with_scoped_text(LOCATION_BOX, LOCATION_LINE, "Presencial")
                .with_scoped_text(LOCATION_BOX, LOCATION_LINE, "Bogotá, D.C.")
                .with_text(SALARY, "$ 3.000.000,00 (Mensual)")
                .with_text(KEYWORDS, "Palabras clave: rust, backend")
                .with_text(REQUIREMENTS, "Educación mínima: Universidad")
                .with_text(REQUIREMENTS, "3 años de experiencia"),
        );
        let page = site.session();

        let raw = adapter().extract_detail(page.as_ref(), link).await.unwrap();

        assert_eq!(raw.title.as_deref(), Some(" Desarrollador Rust "));
        assert_eq!(raw.company.as_deref(), Some("ACME"));
        assert_eq!(raw.location.as_deref(), Some("Bogotá, D.C."));
        assert_eq!(raw.salary.as_deref(), Some("$ 3.000.000,00 (Mensual)"));
        assert_eq!(
            raw.keywords,
            Some(StringOrList::One("Palabras clave: rust, backend".to_string()))
        );
        assert_eq!(raw.requirement_lines.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_detail_ignores_unlabeled_keywords() {
        let link = "https://ct.test/oferta/2";
        let site = FakeSite::new().with_page(
            link,
            FakePage::new()
                .with_text(TITLE, "QA")
                .with_text(COMPANY, "Primary Co")
                .with_text(COMPANY_FALLBACK, "Fallback Co")
                .with_text(KEYWORDS, "Publicado hace 2 horas"),
        );
        let page = site.session();

        let raw = adapter().extract_detail(page.as_ref(), link).await.unwrap();
        assert_eq!(raw.company.as_deref(), Some("Primary Co"));
        assert_eq!(raw.keywords, None);
        assert_eq!(raw.location, None);
        assert!(raw.requirement_lines.is_empty());
    }

    #[tokio::test]
    async fn test_extract_detail_finds_keyword_label_mid_text() {
        let link = "https://ct.test/oferta/3";
        let site = FakeSite::new().with_page(
            link,
            FakePage::new()
                .with_text(TITLE, "Backend")
                .with_text(KEYWORDS, "Empleo destacado. Palabras clave: rust, go"),
        );
        let page = site.session();

        let raw = adapter().extract_detail(page.as_ref(), link).await.unwrap();
        assert_eq!(
            raw.keywords,
            Some(StringOrList::One("Palabras clave: rust, go".to_string()))
        );
    }

    #[tokio::test]
    async fn test_extract_detail_unreachable_is_none() {
        let site = FakeSite::new();
        let page = site.session();
        assert!(adapter()
            .extract_detail(page.as_ref(), "https://ct.test/oferta/404")
            .await
            .is_none());
    }
}
