// Crawl Orchestrator - runs source passes and reports per-source summaries

use crate::application::cancel::CancelToken;
use crate::application::config::CrawlConfig;
use crate::application::frontier::StopReason;
use crate::application::reconciler::Reconciler;
use crate::application::sources::{SourceAdapter, SourceRegistry};
use crate::domain::normalizer::normalize;
use crate::domain::SourceKind;
use crate::error::Result;
use crate::port::{IdProvider, PageAccessor, PageAccessorFactory, PostingStore, TimeProvider, UpsertOutcome};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Counters of one completed source pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub discovered: usize,
    pub pages_visited: usize,
    pub stop_reason: StopReason,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Links whose detail page could not be loaded or had no title
    pub skipped: usize,
    /// Postings the store rejected
    pub failed: usize,
    pub cancelled: bool,
}

impl CrawlSummary {
    fn new(discovered: usize, pages_visited: usize, stop_reason: StopReason) -> Self {
        Self {
            discovered,
            pages_visited,
            stop_reason,
            inserted: 0,
            updated: 0,
            unchanged: 0,
            skipped: 0,
            failed: 0,
            cancelled: stop_reason == StopReason::Cancelled,
        }
    }

    pub fn reconciled(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }

    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// "Ran" versus "failed" for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Completed(CrawlSummary),
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: SourceKind,
    #[serde(flatten)]
    pub status: SourceStatus,
}

impl SourceReport {
    pub fn summary(&self) -> Option<&CrawlSummary> {
        match &self.status {
            SourceStatus::Completed(summary) => Some(summary),
            SourceStatus::Failed { .. } => None,
        }
    }
}

/// Result of one `crawl` call
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub run_id: String,
    pub started_at: i64,
    pub finished_at: i64,
    pub sources: Vec<SourceReport>,
}

impl CrawlReport {
    pub fn source(&self, kind: SourceKind) -> Option<&SourceReport> {
        self.sources.iter().find(|r| r.source == kind)
    }

    pub fn total_reconciled(&self) -> usize {
        self.sources.iter().filter_map(SourceReport::summary).map(CrawlSummary::reconciled).sum()
    }

    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|r| r.summary().is_none()).count()
    }
}

/// Drives source adapters and feeds their output to the reconciler
pub struct CrawlOrchestrator {
    registry: SourceRegistry,
    accessors: Arc<dyn PageAccessorFactory>,
    reconciler: Arc<Reconciler>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    config: CrawlConfig,
}

impl CrawlOrchestrator {
    pub fn new(
        registry: SourceRegistry,
        accessors: Arc<dyn PageAccessorFactory>,
        store: Arc<dyn PostingStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        config: CrawlConfig,
    ) -> Self {
        let reconciler = Arc::new(Reconciler::new(store, &config));
        Self {
            registry,
            accessors,
            reconciler,
            id_provider,
            time_provider,
            config,
        }
    }

    /// Run one pass per requested source (all registered when empty)
    ///
    /// # Errors
    /// Only a store that cannot be reached fails the whole call; every other
    /// failure is reported per source as [`SourceStatus::Failed`].
    pub async fn crawl(&self, sources: &[SourceKind], cancel: CancelToken) -> Result<CrawlReport> {
        let mut kinds: Vec<SourceKind> = Vec::new();
        let requested = if sources.is_empty() { self.registry.kinds() } else { sources.to_vec() };
        for kind in requested {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }

        let run_id = self.id_provider.generate_id();
        let started_at = self.time_provider.now_millis();
        info!(run_id = %run_id, sources = ?kinds, concurrent = self.config.concurrent_sources, "Crawl started");

        let reports = if self.config.concurrent_sources {
            let passes = kinds.iter().map(|kind| self.run_source(*kind, cancel.clone()));
            futures::future::join_all(passes)
                .await
                .into_iter()
                .collect::<Result<Vec<_>>>()?
        } else {
            let mut reports = Vec::with_capacity(kinds.len());
            for kind in &kinds {
                reports.push(self.run_source(*kind, cancel.clone()).await?);
            }
            reports
        };

        let report = CrawlReport {
            run_id,
            started_at,
            finished_at: self.time_provider.now_millis(),
            sources: reports,
        };
        info!(
            run_id = %report.run_id,
            reconciled = report.total_reconciled(),
            failed_sources = report.failed_sources(),
            "Crawl finished"
        );
        Ok(report)
    }

    /// One source pass on its own page session
    ///
    /// The pass runs in a spawned task so an adapter panic only fails this
    /// source; the session is closed on every path.
    async fn run_source(&self, kind: SourceKind, cancel: CancelToken) -> Result<SourceReport> {
        let failed = |reason: String| {
            error!(source = %kind, reason = %reason, "Source failed");
            Ok(SourceReport {
                source: kind,
                status: SourceStatus::Failed { reason },
            })
        };

        let adapter = match self.registry.get(kind) {
            Ok(adapter) => adapter,
            Err(e) => return failed(e.to_string()),
        };
        let page = match self.accessors.open().await {
            Ok(page) => page,
            Err(e) => return failed(format!("page session unavailable: {}", e)),
        };

        let handle = tokio::spawn(source_pass(
            adapter,
            Arc::clone(&page),
            Arc::clone(&self.reconciler),
            self.config.clone(),
            cancel,
        ));
        let outcome = handle.await;

        if let Err(e) = page.close().await {
            warn!(source = %kind, error = %e, "Failed to close page session");
        }

        match outcome {
            Ok(Ok(summary)) => {
                info!(
                    source = %kind,
                    discovered = summary.discovered,
                    inserted = summary.inserted,
                    updated = summary.updated,
                    unchanged = summary.unchanged,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    stop_reason = ?summary.stop_reason,
                    "Source completed"
                );
                Ok(SourceReport {
                    source: kind,
                    status: SourceStatus::Completed(summary),
                })
            }
            Ok(Err(e)) if e.is_store_unavailable() => {
                error!(source = %kind, error = %e, "Store unavailable, aborting crawl");
                Err(e)
            }
            Ok(Err(e)) => failed(e.to_string()),
            Err(join_err) if join_err.is_panic() => failed(format!("adapter panicked: {}", join_err)),
            Err(join_err) => failed(format!("source pass aborted: {}", join_err)),
        }
    }
}

async fn source_pass(
    adapter: Arc<dyn SourceAdapter>,
    page: Arc<dyn PageAccessor>,
    reconciler: Arc<Reconciler>,
    config: CrawlConfig,
    mut cancel: CancelToken,
) -> Result<CrawlSummary> {
    let source = adapter.kind();
    let discovery = adapter.discover_links(page.as_ref(), &cancel).await?;
    let mut summary = CrawlSummary::new(discovery.links.len(), discovery.pages_visited, discovery.stop_reason);

    for (index, link) in discovery.links.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(source = %source, processed = index, "Crawl cancelled between links");
            summary.cancelled = true;
            break;
        }
        if index > 0 && !politeness_pause(adapter.politeness_delay(), &config, &mut cancel).await {
            info!(source = %source, processed = index, "Crawl cancelled during politeness delay");
            summary.cancelled = true;
            break;
        }

        let Some(raw) = adapter.extract_detail(page.as_ref(), link).await else {
            summary.skipped += 1;
            continue;
        };

        let posting = match normalize(raw) {
            Ok(posting) => posting,
            Err(e) => {
                warn!(source = %source, link = %link, error = %e, "Skipping record");
                summary.skipped += 1;
                continue;
            }
        };

        match reconciler.reconcile(&posting).await {
            Ok(outcome) => summary.record(outcome),
            Err(e) if e.is_store_unavailable() => return Err(e),
            Err(e) => {
                warn!(source = %source, link = %link, error = %e, "Posting not stored");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Sleep between detail fetches; returns false if cancelled meanwhile
async fn politeness_pause(base: Duration, config: &CrawlConfig, cancel: &mut CancelToken) -> bool {
    if !config.politeness_enabled {
        return !cancel.is_cancelled();
    }
    let jitter = config.politeness_jitter.mul_f64(rand::random::<f64>());
    tokio::select! {
        _ = sleep(base + jitter) => true,
        _ = cancel.cancelled() => false,
    }
}
