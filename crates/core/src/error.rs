// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Page accessor error: {0}")]
    Accessor(#[from] crate::port::AccessorError),

    #[error("Store error: {0}")]
    Store(#[from] crate::port::StoreError),

    /// Unexpected defect inside one source adapter (aborts that source only)
    #[error("Adapter failure in {source_id}: {reason}")]
    Adapter { source_id: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn adapter(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Adapter {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }

    /// True when the persistence collaborator cannot be reached
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, AppError::Store(crate::port::StoreError::Unavailable(_)))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
