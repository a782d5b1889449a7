// Harvest Service - core use cases exposed to the outer layer

use crate::application::aggregation::{AggregationEngine, AggregationField, ExperienceCount, GroupCount};
use crate::application::cancel::CancelToken;
use crate::application::config::CrawlConfig;
use crate::application::frontier::Discovery;
use crate::application::reconciler::Reconciler;
use crate::application::sources::SourceRegistry;
use crate::domain::normalizer::normalize;
use crate::domain::{JobPosting, RawPosting, SourceKind};
use crate::error::Result;
use crate::port::{PageAccessor, PageAccessorFactory, PostingStore, UpsertOutcome};
use std::sync::Arc;
use tracing::warn;

/// Harvest Service
///
/// Single-step operations; full crawls go through
/// [`CrawlOrchestrator`](crate::application::orchestrator::CrawlOrchestrator).
pub struct HarvestService {
    registry: SourceRegistry,
    accessors: Arc<dyn PageAccessorFactory>,
    reconciler: Reconciler,
    aggregation: AggregationEngine,
}

impl HarvestService {
    pub fn new(
        registry: SourceRegistry,
        accessors: Arc<dyn PageAccessorFactory>,
        store: Arc<dyn PostingStore>,
        config: &CrawlConfig,
    ) -> Self {
        Self {
            registry,
            accessors,
            reconciler: Reconciler::new(Arc::clone(&store), config),
            aggregation: AggregationEngine::new(store),
        }
    }

    /// Unique detail links of one source's listing
    pub async fn discover(&self, source: SourceKind, cancel: &CancelToken) -> Result<Discovery> {
        let adapter = self.registry.get(source)?;
        let page = self.accessors.open().await?;
        let result = adapter.discover_links(page.as_ref(), cancel).await;
        release(page.as_ref(), source).await;
        result
    }

    /// Canonical record of one detail page, `None` when the page cannot be loaded
    ///
    /// A page that loads but yields no usable title is a `Domain` error.
    pub async fn fetch_detail(&self, source: SourceKind, link: &str) -> Result<Option<JobPosting>> {
        match self.fetch_raw(source, link).await? {
            Some(raw) => Ok(Some(normalize(raw)?)),
            None => Ok(None),
        }
    }

    /// Unnormalized record of one detail page, as the adapter extracted it
    pub async fn fetch_raw(&self, source: SourceKind, link: &str) -> Result<Option<RawPosting>> {
        let adapter = self.registry.get(source)?;
        let page = self.accessors.open().await?;
        let raw = adapter.extract_detail(page.as_ref(), link).await;
        release(page.as_ref(), source).await;
        Ok(raw)
    }

    pub async fn reconcile(&self, posting: &JobPosting) -> Result<UpsertOutcome> {
        self.reconciler.reconcile(posting).await
    }

    pub async fn aggregate(&self, field: AggregationField) -> Result<Vec<GroupCount>> {
        self.aggregation.aggregate(field).await
    }

    pub async fn aggregate_experience(&self) -> Result<Vec<ExperienceCount>> {
        self.aggregation.aggregate_experience().await
    }

    pub async fn list_postings(&self) -> Result<Vec<JobPosting>> {
        self.aggregation.list_postings().await
    }
}

async fn release(page: &dyn PageAccessor, source: SourceKind) {
    if let Err(e) = page.close().await {
        warn!(source = %source, error = %e, "Failed to close page session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sources::{GetManfredAdapter, GetManfredConfig};
    use crate::error::AppError;
    use crate::port::page_accessor::mocks::{FakePage, FakeSite};
    use crate::port::posting_store::mocks::InMemoryPostingStore;

    const LIST: &str = "https://manfred.test/ofertas";

    fn service(site: &FakeSite) -> HarvestService {
        let config = CrawlConfig::without_delays();
        let mut registry = SourceRegistry::new();
        let manfred = GetManfredConfig {
            listing_url: LIST.to_string(),
            ..Default::default()
        };
        registry.register(Arc::new(GetManfredAdapter::new(manfred, &config).unwrap()));
        HarvestService::new(
            registry,
            Arc::new(site.clone()),
            Arc::new(InMemoryPostingStore::new()),
            &config,
        )
    }

    #[tokio::test]
    async fn test_discover_and_fetch_release_sessions() {
        let site = FakeSite::new()
            .with_page(
                LIST,
                FakePage::new().with_anchor("div.react-reveal a", "Rust", "/ofertas/1"),
            )
            .with_page("https://manfred.test/ofertas/1", FakePage::new().with_text("h1", "Rust"));
        let service = service(&site);

        let discovery = service.discover(SourceKind::GetManfred, &CancelToken::never()).await.unwrap();
        assert_eq!(discovery.links, vec!["https://manfred.test/ofertas/1"]);

        let posting = service
            .fetch_detail(SourceKind::GetManfred, &discovery.links[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(posting.title, "Rust");

        let missing = service
            .fetch_detail(SourceKind::GetManfred, "https://manfred.test/ofertas/404")
            .await
            .unwrap();
        assert!(missing.is_none());

        assert_eq!(site.opened_count(), 3);
        assert_eq!(site.closed_count(), 3);
    }

    #[tokio::test]
    async fn test_fetch_detail_normalizes_fields() {
        let link = "https://manfred.test/ofertas/2";
        let site = FakeSite::new().with_page(
            link,
            FakePage::new()
                .with_text("h1", "  Backend   Engineer ")
                .with_text("div.kNbsot p strong", " Manfred   Labs "),
        );
        let service = service(&site);

        let raw = service.fetch_raw(SourceKind::GetManfred, link).await.unwrap().unwrap();
        assert_eq!(raw.title.as_deref(), Some("  Backend   Engineer "));

        let posting = service.fetch_detail(SourceKind::GetManfred, link).await.unwrap().unwrap();
        assert_eq!(posting.title, "Backend Engineer");
        assert_eq!(posting.company.as_deref(), Some("Manfred Labs"));
    }

    #[tokio::test]
    async fn test_fetch_detail_without_title_is_domain_error() {
        let link = "https://manfred.test/ofertas/3";
        let site = FakeSite::new().with_page(link, FakePage::new().with_text("h1", "   "));
        let service = service(&site);

        let result = service.fetch_detail(SourceKind::GetManfred, link).await;
        assert!(matches!(result, Err(AppError::Domain(_))));
        assert_eq!(site.closed_count(), 1);
    }

    #[tokio::test]
    async fn test_discover_failure_still_releases_session() {
        let site = FakeSite::new();
        let service = service(&site);

        let result = service.discover(SourceKind::GetManfred, &CancelToken::never()).await;
        assert!(matches!(result, Err(AppError::Adapter { .. })));
        assert_eq!(site.closed_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_source() {
        let site = FakeSite::new();
        let service = service(&site);
        let result = service.discover(SourceKind::Computrabajo, &CancelToken::never()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reconcile_then_aggregate() {
        let site = FakeSite::new();
        let service = service(&site);

        let mut posting = JobPosting::new("Rust Dev").unwrap();
        posting.requirement.experience = Some("4 años".to_string());
        assert_eq!(service.reconcile(&posting).await.unwrap(), UpsertOutcome::Inserted);

        let buckets = service.aggregate_experience().await.unwrap();
        assert_eq!(buckets.iter().map(|b| b.count).collect::<Vec<_>>(), vec![0, 1, 0]);
        assert_eq!(service.list_postings().await.unwrap().len(), 1);
        assert!(service.aggregate(AggregationField::Company).await.unwrap().is_empty());
    }
}
