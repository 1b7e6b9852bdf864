//! Analysis history: persisted records and windowed counts.
//!
//! The [`AnalysisStore`] trait is the storage seam. Two backends ship with
//! the crate:
//!
//! * [`SqliteStore`] - a single SQLite file, used by the server
//! * [`MemoryStore`] - schemaless JSON documents held in memory
//!
//! Records are stored as loosely typed documents in both, so a store can
//! contain rows that no longer decode into an [`AnalysisRecord`]. Readers
//! skip those rows instead of failing the query.
//!
//! [`AnalysisHistory`] is the front used by the rest of the crate. It owns
//! identifier generation, timestamps, and the calendar windows.

pub mod memory;
pub mod sqlite;
pub mod windows;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::core::constants::DEFAULT_HISTORY_LIMIT;
use crate::core::errors::AnalysisResult;
use crate::domain::{AnalysisRecord, AnalysisStats, PredictionResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Storage backend for analysis records.
///
/// Implementations must make `insert` atomic per record and must never
/// replace an existing record with the same identifier.
pub trait AnalysisStore: Send + Sync + std::fmt::Debug {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Persists `record`. Fails if its identifier is already stored.
    fn insert(&self, record: &AnalysisRecord) -> AnalysisResult<()>;

    /// Well-formed records of `user_id`, newest first, at most `limit`.
    fn recent_for(&self, user_id: &str, limit: usize) -> AnalysisResult<Vec<AnalysisRecord>>;

    /// Creation times of every record of `user_id` whose timestamp is readable.
    fn timestamps_for(&self, user_id: &str) -> AnalysisResult<Vec<DateTime<Utc>>>;
}

/// Records inference results and answers history queries over a store.
#[derive(Debug, Clone)]
pub struct AnalysisHistory {
    store: Arc<dyn AnalysisStore>,
    limit: usize,
}

impl AnalysisHistory {
    pub fn new(store: Arc<dyn AnalysisStore>) -> Self {
        Self {
            store,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Sets the default page size of [`list_for`](Self::list_for).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    /// Persists `result` for `user_id` stamped with the current UTC time.
    pub fn record(
        &self,
        user_id: &str,
        notes: &str,
        result: &PredictionResult,
    ) -> AnalysisResult<Uuid> {
        self.record_at(user_id, notes, result, Utc::now())
    }

    /// Persists `result` with an explicit creation time.
    pub fn record_at(
        &self,
        user_id: &str,
        notes: &str,
        result: &PredictionResult,
        created_at: DateTime<Utc>,
    ) -> AnalysisResult<Uuid> {
        let record = AnalysisRecord::new(user_id, notes, result.clone(), created_at);
        self.store.insert(&record)?;
        debug!(
            analysis_id = %record.analysis_id,
            user_id,
            store = self.store.name(),
            "analysis recorded"
        );
        Ok(record.analysis_id)
    }

    /// The newest records of `user_id`, up to the configured limit.
    pub fn list_for(&self, user_id: &str) -> AnalysisResult<Vec<AnalysisRecord>> {
        self.list_for_limit(user_id, self.limit)
    }

    pub fn list_for_limit(&self, user_id: &str, limit: usize) -> AnalysisResult<Vec<AnalysisRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.store.recent_for(user_id, limit)
    }

    /// Counts of `user_id`'s records overall, this month, and this week.
    pub fn stats_for(&self, user_id: &str, now: DateTime<Utc>) -> AnalysisResult<AnalysisStats> {
        let timestamps = self.store.timestamps_for(user_id)?;
        Ok(windows::tally(timestamps, now))
    }
}

/// Orders records newest first. Equal timestamps keep the order given.
pub(crate) fn sort_newest_first(records: &mut [AnalysisRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PredictionEntry;
    use chrono::{Duration, TimeZone};

    fn result() -> PredictionResult {
        PredictionResult {
            top_label: "healthy".into(),
            top_confidence: 90.0,
            ranked: vec![
                PredictionEntry::new("healthy", 90.0),
                PredictionEntry::new("malaria", 10.0),
            ],
        }
    }

    #[test]
    fn test_record_then_list_returns_it_first() {
        let history = AnalysisHistory::new(Arc::new(MemoryStore::new()));
        history.record("u", "older", &result()).unwrap();
        let id = history.record("u", "newer", &result()).unwrap();

        let listed = history.list_for("u").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].analysis_id, id);
        assert_eq!(listed[0].notes, "newer");
    }

    #[test]
    fn test_zero_limit_lists_nothing() {
        let history = AnalysisHistory::new(Arc::new(MemoryStore::new())).with_limit(0);
        history.record("u", "", &result()).unwrap();
        assert!(history.list_for("u").unwrap().is_empty());
    }

    #[test]
    fn test_stats_are_per_user() {
        let history = AnalysisHistory::new(Arc::new(MemoryStore::new()));
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        history.record_at("a", "", &result(), now - Duration::hours(1)).unwrap();
        history.record_at("a", "", &result(), now - Duration::days(40)).unwrap();
        history.record_at("b", "", &result(), now).unwrap();

        let stats = history.stats_for("a", now).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.this_month, 1);
        assert_eq!(stats.this_week, 1);
        assert_eq!(history.stats_for("nobody", now).unwrap(), AnalysisStats::default());
    }
}
