//! SQLite-backed analysis store.

use super::AnalysisStore;
use crate::core::errors::{AnalysisError, AnalysisResult, SimpleError};
use crate::domain::{AnalysisRecord, PredictionResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Stores records in one `analyses` table.
///
/// `result` is kept as JSON text and `created_at` as fixed-width RFC 3339
/// text with nanosecond precision, so ordering by the column text is
/// chronological for every row this store wrote itself.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> AnalysisResult<Self> {
        let path = path.as_ref();
        let conn =
            Connection::open(path).map_err(|e| AnalysisError::persistence_error("open", e))?;
        let store = Self::with_connection(conn)?;
        debug!(path = %path.display(), "opened analysis database");
        Ok(store)
    }

    /// A private database that lives as long as the store.
    pub fn open_in_memory() -> AnalysisResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| AnalysisError::persistence_error("open", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> AnalysisResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| AnalysisError::persistence_error("open", e))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> AnalysisResult<()> {
        let conn = self.lock("init schema")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS analyses (
                analysis_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                notes TEXT,
                result TEXT,
                created_at TEXT
            );
            CREATE INDEX IF NOT EXISTS analyses_user_created
                ON analyses (user_id, created_at);",
        )
        .map_err(|e| AnalysisError::persistence_error("init schema", e))
    }

    fn lock(&self, operation: &str) -> AnalysisResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            AnalysisError::persistence_error(operation, SimpleError::new("connection lock poisoned"))
        })
    }
}

impl AnalysisStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn insert(&self, record: &AnalysisRecord) -> AnalysisResult<()> {
        let result = serde_json::to_string(&record.result)
            .map_err(|e| AnalysisError::persistence_error("insert", e))?;
        let created_at = record
            .created_at
            .to_rfc3339_opts(SecondsFormat::Nanos, true);

        let conn = self.lock("insert")?;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM analyses WHERE analysis_id = ?1",
                params![record.analysis_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AnalysisError::persistence_error("insert", e))?;
        if exists.is_some() {
            return Err(AnalysisError::persistence_error(
                "insert",
                SimpleError::new(format!("analysis {} already exists", record.analysis_id)),
            ));
        }

        conn.execute(
            "INSERT INTO analyses (analysis_id, user_id, notes, result, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.analysis_id.to_string(),
                record.user_id,
                record.notes,
                result,
                created_at,
            ],
        )
        .map_err(|e| AnalysisError::persistence_error("insert", e))?;
        Ok(())
    }

    fn recent_for(&self, user_id: &str, limit: usize) -> AnalysisResult<Vec<AnalysisRecord>> {
        let conn = self.lock("list")?;
        let mut stmt = conn
            .prepare(
                "SELECT analysis_id, user_id, notes, result, created_at
                 FROM analyses WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(|e| AnalysisError::persistence_error("list", e))?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(RawRow {
                    analysis_id: row.get(0)?,
                    user_id: row.get(1)?,
                    notes: row.get(2)?,
                    result: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .map_err(|e| AnalysisError::persistence_error("list", e))?;

        let mut records = Vec::new();
        for row in rows {
            if records.len() >= limit {
                break;
            }
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(user_id, error = %e, "skipping unreadable analysis row");
                    continue;
                }
            };
            match row.into_record() {
                Ok(record) => records.push(record),
                Err(reason) => warn!(user_id, reason, "skipping malformed analysis row"),
            }
        }
        Ok(records)
    }

    fn timestamps_for(&self, user_id: &str) -> AnalysisResult<Vec<DateTime<Utc>>> {
        let conn = self.lock("stats")?;
        let mut stmt = conn
            .prepare("SELECT created_at FROM analyses WHERE user_id = ?1")
            .map_err(|e| AnalysisError::persistence_error("stats", e))?;
        let rows = stmt
            .query_map(params![user_id], |row| row.get::<_, Option<String>>(0))
            .map_err(|e| AnalysisError::persistence_error("stats", e))?;

        let timestamps = rows
            .filter_map(|row| row.ok().flatten())
            .filter_map(|raw| parse_timestamp(&raw))
            .collect();
        Ok(timestamps)
    }
}

/// Untyped row as read from the table. Every column may hold anything.
struct RawRow {
    analysis_id: Option<String>,
    user_id: String,
    notes: Option<String>,
    result: Option<String>,
    created_at: Option<String>,
}

impl RawRow {
    fn into_record(self) -> Result<AnalysisRecord, &'static str> {
        let analysis_id = self
            .analysis_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or("analysis_id is not a UUID")?;
        let result: PredictionResult = self
            .result
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .ok_or("result is not a prediction")?;
        let created_at = self
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .ok_or("created_at is not a timestamp")?;

        Ok(AnalysisRecord {
            analysis_id,
            user_id: self.user_id,
            notes: self.notes.unwrap_or_default(),
            result,
            created_at,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PredictionEntry;
    use chrono::TimeZone;

    fn record(user: &str, at: DateTime<Utc>) -> AnalysisRecord {
        let result = PredictionResult {
            top_label: "babesia".into(),
            top_confidence: 75.0,
            ranked: vec![
                PredictionEntry::new("babesia", 75.0),
                PredictionEntry::new("healthy", 25.0),
            ],
        };
        AnalysisRecord::new(user, "thin film", result, at)
    }

    #[test]
    fn test_round_trip_keeps_every_field() {
        let store = SqliteStore::open_in_memory().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        let original = record("u", at);
        store.insert(&original).unwrap();

        let listed = store.recent_for("u", 5).unwrap();
        assert_eq!(listed, vec![original]);
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let r = record("u", Utc::now());
        store.insert(&r).unwrap();
        assert!(matches!(
            store.insert(&r),
            Err(AnalysisError::Persistence { .. })
        ));
    }

    #[test]
    fn test_sub_second_ordering() {
        let store = SqliteStore::open_in_memory().unwrap();
        let base = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let early = record("u", base + chrono::Duration::nanoseconds(5));
        let late = record("u", base + chrono::Duration::milliseconds(900));
        store.insert(&late).unwrap();
        store.insert(&early).unwrap();

        let listed = store.recent_for("u", 5).unwrap();
        assert_eq!(listed[0].analysis_id, late.analysis_id);
        assert_eq!(listed[1].analysis_id, early.analysis_id);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&record("u", Utc::now())).unwrap();
        {
            let conn = store.lock("test").unwrap();
            conn.execute(
                "INSERT INTO analyses (analysis_id, user_id, notes, result, created_at)
                 VALUES ('not-a-uuid', 'u', NULL, '{}', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO analyses (analysis_id, user_id, notes, result, created_at)
                 VALUES (?1, 'u', NULL, NULL, 'yesterday')",
                params![Uuid::new_v4().to_string()],
            )
            .unwrap();
        }

        assert_eq!(store.recent_for("u", 10).unwrap().len(), 1);
        assert_eq!(store.timestamps_for("u").unwrap().len(), 2);
    }
}
