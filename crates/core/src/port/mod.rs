// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod page_accessor;
pub mod posting_store;
pub mod time_provider;

// Re-exports
pub use id_provider::{IdProvider, SequentialIdProvider, UuidProvider};
pub use page_accessor::{
    AccessorError, Anchor, LoadState, NavigateOptions, PageAccessor, PageAccessorFactory,
};
pub use posting_store::{PostingStore, StoreError, UpsertOutcome};
pub use time_provider::{FixedTimeProvider, ManualTimeProvider, SystemTimeProvider, TimeProvider};
