// SQLite PostingStore Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use jobharvest_core::domain::{JobPosting, Requirement};
use jobharvest_core::port::{PostingStore, StoreError, TimeProvider, UpsertOutcome};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

const SELECT_COLUMNS: &str = "SELECT title, company, location, salary, keywords, education, \
     experience, languages, skills, first_seen_at, last_seen_at FROM job_postings";

/// A stored posting with its bookkeeping timestamps (epoch ms)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPosting {
    pub posting: JobPosting,
    pub first_seen_at: i64,
    pub last_seen_at: i64,
}

pub struct SqlitePostingStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqlitePostingStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    /// Every record with timestamps, ordered by title
    pub async fn list_with_timestamps(&self) -> Result<Vec<StoredPosting>, StoreError> {
        let rows: Vec<PostingRow> = sqlx::query_as(&format!("{} ORDER BY title", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(PostingRow::into_stored).collect()
    }

    /// Close the pool; later calls fail with `StoreError::Unavailable`
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn to_json(values: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(values).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[async_trait]
impl PostingStore for SqlitePostingStore {
    /// Insert, overwrite, or touch the row keyed by `posting.title`
    ///
    /// Every step is one autocommit statement that takes the write lock
    /// before reading, so concurrent writers queue on the busy timeout
    /// instead of failing a read-to-write upgrade. A writer that loses the
    /// insert race falls through to the update steps.
    async fn upsert_by_key(&self, posting: &JobPosting) -> Result<UpsertOutcome, StoreError> {
        let now = self.time_provider.now_millis();
        let keywords = to_json(&posting.keywords)?;
        let languages = to_json(&posting.requirement.languages)?;
        let skills = to_json(&posting.requirement.skills)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO job_postings (
                title, company, location, salary, keywords,
                education, experience, languages, skills,
                first_seen_at, last_seen_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(title) DO NOTHING
            "#,
        )
        .bind(&posting.title)
        .bind(&posting.company)
        .bind(&posting.location)
        .bind(&posting.salary)
        .bind(&keywords)
        .bind(&posting.requirement.education)
        .bind(&posting.requirement.experience)
        .bind(&languages)
        .bind(&skills)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        let outcome = if inserted > 0 {
            UpsertOutcome::Inserted
        } else {
            let updated = sqlx::query(
                r#"
                UPDATE job_postings
                SET company = ?1, location = ?2, salary = ?3, keywords = ?4,
                    education = ?5, experience = ?6, languages = ?7, skills = ?8,
                    last_seen_at = ?9
                WHERE title = ?10
                  AND (company IS NOT ?1 OR location IS NOT ?2 OR salary IS NOT ?3
                       OR keywords IS NOT ?4 OR education IS NOT ?5 OR experience IS NOT ?6
                       OR languages IS NOT ?7 OR skills IS NOT ?8)
                "#,
            )
            .bind(&posting.company)
            .bind(&posting.location)
            .bind(&posting.salary)
            .bind(&keywords)
            .bind(&posting.requirement.education)
            .bind(&posting.requirement.experience)
            .bind(&languages)
            .bind(&skills)
            .bind(now)
            .bind(&posting.title)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

            if updated > 0 {
                UpsertOutcome::Updated
            } else {
                let touched = sqlx::query("UPDATE job_postings SET last_seen_at = ? WHERE title = ?")
                    .bind(now)
                    .bind(&posting.title)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                if touched == 0 {
                    // Row vanished between steps; let the caller retry
                    return Err(StoreError::Conflict(format!(
                        "row for {:?} disappeared during upsert",
                        posting.title
                    )));
                }
                UpsertOutcome::Unchanged
            }
        };

        debug!(title = %posting.title, outcome = %outcome, "Upserted posting");
        Ok(outcome)
    }

    async fn read_all(&self) -> Result<Vec<JobPosting>, StoreError> {
        Ok(self
            .list_with_timestamps()
            .await?
            .into_iter()
            .map(|stored| stored.posting)
            .collect())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<JobPosting>, StoreError> {
        let row: Option<PostingRow> = sqlx::query_as(&format!("{} WHERE title = ?", SELECT_COLUMNS))
            .bind(title)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(|r| r.into_stored().map(|stored| stored.posting)).transpose()
    }

    async fn count(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM job_postings")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

// Database row representation
#[derive(Debug, sqlx::FromRow)]
struct PostingRow {
    title: String,
    company: Option<String>,
    location: Option<String>,
    salary: Option<String>,
    keywords: String,
    education: Option<String>,
    experience: Option<String>,
    languages: String,
    skills: String,
    first_seen_at: i64,
    last_seen_at: i64,
}

impl PostingRow {
    fn into_stored(self) -> Result<StoredPosting, StoreError> {
        let list = |column: &str, raw: &str| -> Result<Vec<String>, StoreError> {
            serde_json::from_str(raw).map_err(|e| {
                StoreError::Corrupt(format!("{} of {:?}: {}", column, self.title, e))
            })
        };

        let keywords = list("keywords", &self.keywords)?;
        let languages = list("languages", &self.languages)?;
        let skills = list("skills", &self.skills)?;

        Ok(StoredPosting {
            posting: JobPosting {
                title: self.title,
                company: self.company,
                location: self.location,
                salary: self.salary,
                keywords,
                requirement: Requirement {
                    education: self.education,
                    experience: self.experience,
                    languages,
                    skills,
                },
            },
            first_seen_at: self.first_seen_at,
            last_seen_at: self.last_seen_at,
        })
    }
}
