//! Persisted analysis records and their aggregates.

use super::prediction::PredictionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One inference request as stored: who asked, what came back, and when.
///
/// Records are created once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub analysis_id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub notes: String,
    pub result: PredictionResult,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Creates a record with a fresh identifier stamped at `created_at`.
    pub fn new(
        user_id: impl Into<String>,
        notes: impl Into<String>,
        result: PredictionResult,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            analysis_id: Uuid::new_v4(),
            user_id: user_id.into(),
            notes: notes.into(),
            result,
            created_at,
        }
    }
}

/// Record counts for one user over fixed calendar windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// All records of the user.
    pub total: u64,
    /// Records since the first instant of the current UTC month.
    pub this_month: u64,
    /// Records since Monday 00:00:00 UTC of the current ISO week.
    pub this_week: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::PredictionEntry;
    use chrono::TimeZone;

    #[test]
    fn test_created_at_serializes_as_iso8601() {
        let result = PredictionResult {
            top_label: "healthy".into(),
            top_confidence: 100.0,
            ranked: vec![PredictionEntry::new("healthy", 100.0)],
        };
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();
        let record = AnalysisRecord::new("u-1", "", result, at);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["created_at"], "2024-03-04T05:06:07Z");
        assert_eq!(json["user_id"], "u-1");

        let back: AnalysisRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_identifiers_are_unique() {
        let result = PredictionResult {
            top_label: "a".into(),
            top_confidence: 100.0,
            ranked: vec![PredictionEntry::new("a", 100.0)],
        };
        let now = Utc::now();
        let a = AnalysisRecord::new("u", "", result.clone(), now);
        let b = AnalysisRecord::new("u", "", result, now);
        assert_ne!(a.analysis_id, b.analysis_id);
    }
}
