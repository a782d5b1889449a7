// Application Layer - Use Cases and Business Logic

pub mod aggregation;
pub mod cancel;
pub mod config;
pub mod constants;
pub mod frontier;
pub mod harvest_service;
pub mod orchestrator;
pub mod reconciler;
pub mod sources;

// Re-exports
pub use aggregation::{AggregationEngine, AggregationField, ExperienceCount, GroupCount};
pub use cancel::{cancel_channel, CancelSender, CancelToken};
pub use config::CrawlConfig;
pub use frontier::{Discovery, LinkFrontier, ListItem, ListingRules, StopReason};
pub use harvest_service::HarvestService;
pub use orchestrator::{CrawlOrchestrator, CrawlReport, CrawlSummary, SourceReport, SourceStatus};
pub use reconciler::Reconciler;
pub use sources::{SourceAdapter, SourceRegistry};
