// sqlx::Error -> StoreError
// (orphan rules: no From<sqlx::Error> for StoreError outside core)

use jobharvest_core::port::StoreError;

/// Map a sqlx error onto the store taxonomy by SQLite result code
///
/// See https://www.sqlite.org/rescode.html
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => {
                let code_str = code.as_ref();
                match code_str {
                    // UNIQUE / PRIMARY KEY constraint failed
                    "2067" | "1555" => StoreError::Conflict(format!(
                        "{} ({})",
                        db_err.message(),
                        code_str
                    )),
                    // SQLITE_BUSY_SNAPSHOT: a read-then-write lost a race, safe to retry
                    "517" => StoreError::Conflict(format!(
                        "{} ({})",
                        db_err.message(),
                        code_str
                    )),
                    // SQLITE_BUSY / SQLITE_LOCKED after the busy timeout
                    "5" | "6" => StoreError::Unavailable(format!(
                        "Database locked: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    // SQLITE_CANTOPEN
                    "14" => StoreError::Unavailable(format!(
                        "Cannot open database: {}",
                        db_err.message()
                    )),
                    "13" => StoreError::Database(format!("Database full: {}", db_err.message())),
                    _ => StoreError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            }
            None => StoreError::Database(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_) => StoreError::Corrupt(err.to_string()),
        _ => StoreError::Database(err.to_string()),
    }
}
