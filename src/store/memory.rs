//! In-memory document store.

use super::{AnalysisStore, sort_newest_first};
use crate::core::errors::{AnalysisError, AnalysisResult, SimpleError};
use crate::domain::AnalysisRecord;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::RwLock;
use tracing::warn;

/// Keeps records as JSON documents in insertion order.
///
/// Nothing survives the process. Used for tests and for running the server
/// without a database file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `document` as is, without any validation.
    pub fn insert_raw(&self, document: Value) -> AnalysisResult<()> {
        self.documents
            .write()
            .map_err(|_| poisoned("insert"))?
            .push(document);
        Ok(())
    }

    /// Number of stored documents, malformed ones included.
    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnalysisStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn insert(&self, record: &AnalysisRecord) -> AnalysisResult<()> {
        let document = serde_json::to_value(record)
            .map_err(|e| AnalysisError::persistence_error("insert", e))?;
        let id = record.analysis_id.to_string();

        let mut documents = self.documents.write().map_err(|_| poisoned("insert"))?;
        if documents
            .iter()
            .any(|doc| doc.get("analysis_id").and_then(Value::as_str) == Some(id.as_str()))
        {
            return Err(AnalysisError::persistence_error(
                "insert",
                SimpleError::new(format!("analysis {id} already exists")),
            ));
        }
        documents.push(document);
        Ok(())
    }

    fn recent_for(&self, user_id: &str, limit: usize) -> AnalysisResult<Vec<AnalysisRecord>> {
        let documents = self.documents.read().map_err(|_| poisoned("list"))?;

        // Walk newest insertion first so the stable sort breaks timestamp
        // ties in favour of the later insert.
        let mut records: Vec<AnalysisRecord> = documents
            .iter()
            .rev()
            .filter(|doc| belongs_to(doc, user_id))
            .filter_map(|doc| match serde_json::from_value(doc.clone()) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(user_id, error = %e, "skipping malformed analysis document");
                    None
                }
            })
            .collect();

        sort_newest_first(&mut records);
        records.truncate(limit);
        Ok(records)
    }

    fn timestamps_for(&self, user_id: &str) -> AnalysisResult<Vec<DateTime<Utc>>> {
        let documents = self.documents.read().map_err(|_| poisoned("stats"))?;
        Ok(documents
            .iter()
            .filter(|doc| belongs_to(doc, user_id))
            .filter_map(|doc| doc.get("created_at").and_then(Value::as_str))
            .filter_map(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|at| at.with_timezone(&Utc))
            .collect())
    }
}

fn belongs_to(document: &Value, user_id: &str) -> bool {
    document.get("user_id").and_then(Value::as_str) == Some(user_id)
}

fn poisoned(operation: &str) -> AnalysisError {
    AnalysisError::persistence_error(operation, SimpleError::new("store lock poisoned"))
}
