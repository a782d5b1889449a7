//! Aggregation Engine
//!
//! Stateless grouping over the full stored record set. Every call reads the
//! store again; nothing is cached between calls.

use crate::domain::normalizer::{city_of, clean_salary, clean_text};
use crate::domain::{DomainError, ExperienceLevel, JobPosting};
use crate::error::Result;
use crate::port::PostingStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Field a grouping is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationField {
    Company,
    /// Grouped by city (text before the first comma)
    Location,
    /// Grouped by cleaned salary
    Salary,
    Keyword,
    Education,
    Language,
    Skill,
}

impl AggregationField {
    pub const ALL: [AggregationField; 7] = [
        AggregationField::Company,
        AggregationField::Location,
        AggregationField::Salary,
        AggregationField::Keyword,
        AggregationField::Education,
        AggregationField::Language,
        AggregationField::Skill,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationField::Company => "company",
            AggregationField::Location => "location",
            AggregationField::Salary => "salary",
            AggregationField::Keyword => "keyword",
            AggregationField::Education => "education",
            AggregationField::Language => "language",
            AggregationField::Skill => "skill",
        }
    }

    /// Grouping keys one posting contributes (empty values excluded)
    fn keys(&self, posting: &JobPosting) -> Vec<String> {
        let requirement = &posting.requirement;
        match self {
            AggregationField::Company => posting.company.as_deref().and_then(clean_text).into_iter().collect(),
            AggregationField::Location => posting.location.as_deref().and_then(city_of).into_iter().collect(),
            AggregationField::Salary => posting.salary.as_deref().and_then(clean_salary).into_iter().collect(),
            AggregationField::Education => requirement.education.as_deref().and_then(clean_text).into_iter().collect(),
            AggregationField::Keyword => each(&posting.keywords),
            AggregationField::Language => each(&requirement.languages),
            AggregationField::Skill => each(&requirement.skills),
        }
    }
}

fn each(values: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(values.len());
    for key in values.iter().filter_map(|v| clean_text(v)) {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

impl std::fmt::Display for AggregationField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationField {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "company" | "companies" => Ok(AggregationField::Company),
            "location" | "locations" | "city" => Ok(AggregationField::Location),
            "salary" | "salaries" => Ok(AggregationField::Salary),
            "keyword" | "keywords" => Ok(AggregationField::Keyword),
            "education" => Ok(AggregationField::Education),
            "language" | "languages" => Ok(AggregationField::Language),
            "skill" | "skills" => Ok(AggregationField::Skill),
            other => Err(DomainError::UnknownField(other.to_string())),
        }
    }
}

/// One group of a `group_by` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub key: String,
    pub count: u64,
}

/// One experience bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperienceCount {
    pub level: ExperienceLevel,
    pub count: u64,
}

/// Count postings per distinct key, sorted by count desc then key asc
pub fn group_by(postings: &[JobPosting], field: AggregationField) -> Vec<GroupCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for posting in postings {
        for key in field.keys(posting) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    let mut groups: Vec<GroupCount> = counts
        .into_iter()
        .map(|(key, count)| GroupCount { key, count })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    groups
}

/// Exactly one entry per [`ExperienceLevel`], in `ALL` order
///
/// Postings whose experience text has no derivable bucket are not counted.
pub fn experience_buckets(postings: &[JobPosting]) -> Vec<ExperienceCount> {
    let mut counts: HashMap<ExperienceLevel, u64> = HashMap::new();
    for posting in postings {
        match ExperienceLevel::from_raw(posting.requirement.experience.as_deref()) {
            Some(level) => *counts.entry(level).or_insert(0) += 1,
            None => debug!(
                title = %posting.title,
                experience = ?posting.requirement.experience,
                "Experience not derivable, excluded from buckets"
            ),
        }
    }

    ExperienceLevel::ALL
        .into_iter()
        .map(|level| ExperienceCount {
            level,
            count: counts.get(&level).copied().unwrap_or(0),
        })
        .collect()
}

/// Store-backed aggregation queries
pub struct AggregationEngine {
    store: Arc<dyn PostingStore>,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn PostingStore>) -> Self {
        Self { store }
    }

    pub async fn aggregate(&self, field: AggregationField) -> Result<Vec<GroupCount>> {
        let postings = self.store.read_all().await?;
        Ok(group_by(&postings, field))
    }

    pub async fn aggregate_experience(&self) -> Result<Vec<ExperienceCount>> {
        let postings = self.store.read_all().await?;
        Ok(experience_buckets(&postings))
    }

    /// Every stored posting ordered by title
    pub async fn list_postings(&self) -> Result<Vec<JobPosting>> {
        let mut postings = self.store.read_all().await?;
        postings.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(postings)
    }
}
