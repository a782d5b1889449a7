// Job Posting Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Requirement block of a canonical posting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub education: Option<String>,
    /// Raw experience text as stored (e.g. "3 años"); bucketed only when aggregating
    pub experience: Option<String>,
    pub languages: Vec<String>,
    pub skills: Vec<String>,
}

/// Canonical job posting, keyed uniquely by `title`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    /// Raw salary text; cleanup happens at aggregation time only
    pub salary: Option<String>,
    pub keywords: Vec<String>,
    pub requirement: Requirement,
}

impl JobPosting {
    /// Create a posting with only its key set
    ///
    /// The title is trimmed; an empty title is rejected because it is the
    /// record's unique key.
    pub fn new(title: impl Into<String>) -> Result<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(DomainError::EmptyTitle);
        }

        Ok(Self {
            title,
            company: None,
            location: None,
            salary: None,
            keywords: Vec::new(),
            requirement: Requirement::default(),
        })
    }

    /// Check the key invariant on a posting built field by field
    ///
    /// The title must be non-blank and already trimmed, so `" Rust Dev "`
    /// can never become a second record next to `"Rust Dev"`.
    pub fn validate(&self) -> Result<()> {
        let trimmed = self.title.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyTitle);
        }
        if trimmed.len() != self.title.len() {
            return Err(DomainError::UntrimmedTitle(self.title.clone()));
        }
        Ok(())
    }
}

/// A field that sites expose either as one string or as a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for StringOrList {
    fn from(value: &str) -> Self {
        StringOrList::One(value.to_string())
    }
}

impl From<String> for StringOrList {
    fn from(value: String) -> Self {
        StringOrList::One(value)
    }
}

impl From<Vec<String>> for StringOrList {
    fn from(value: Vec<String>) -> Self {
        StringOrList::Many(value)
    }
}

/// Pre-normalization record as read from a detail page
///
/// Every field may be missing: a selector that matched nothing is a field
/// miss, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPosting {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub keywords: Option<StringOrList>,
    /// Requirement bullets in page order, labels included
    pub requirement_lines: Vec<String>,
    /// Languages published outside the requirement bullets
    pub languages: Option<StringOrList>,
}
