// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Posting title must not be empty")]
    EmptyTitle,

    #[error("Posting title has surrounding whitespace: {0:?}")]
    UntrimmedTitle(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Unknown aggregation field: {0}")]
    UnknownField(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
