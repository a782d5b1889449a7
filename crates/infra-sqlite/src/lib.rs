// jobharvest Infrastructure - SQLite Adapter
// Implements: PostingStore

mod connection;
mod error;
mod migration;
mod posting_store;

pub use connection::create_pool;
pub use migration::run_migrations;
pub use posting_store::{SqlitePostingStore, StoredPosting};

// Note: sqlx::Error conversion lives in error.rs as a helper function
// (orphan rules: cannot implement From<sqlx::Error> for StoreError here)
