//! Typed records of completed message exchanges.
//!
//! Every resolved exchange produces exactly one immutable response value.
//! Streaming responses carry a [`ResultSummary`] only once their stream is
//! exhausted; a mid-stream response (`has_more`) carries none.

use serde::Serialize;

use crate::bolt::message::SuccessMessage;

use super::value::Value;

/// One row of a result stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    /// Create a record from its field values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Field value at `index`. Field order matches the keys of the
    /// [`RunResponse`] the record belongs to.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All field values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the record into its field values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Outcome of a RUN exchange.
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    /// Query id, present when the server supports multiple open results
    /// per transaction
    pub query_id: Option<i64>,
    /// Result column names
    pub keys: Vec<String>,
    /// Milliseconds until the result was available
    pub result_available_after: Option<i64>,
}

impl RunResponse {
    /// Extract from a RUN SUCCESS.
    pub fn from_success(summary: &SuccessMessage) -> Self {
        Self {
            query_id: summary.qid(),
            keys: summary.fields().unwrap_or_default(),
            result_available_after: summary.t_first(),
        }
    }
}

/// Outcome of a PULL exchange.
#[derive(Debug, Clone, Serialize)]
pub struct PullResponse {
    /// Streamed records
    pub records: Vec<Record>,
    /// Present iff the stream is exhausted
    pub summary: Option<ResultSummary>,
    /// Whether more records remain on the server
    pub has_more: bool,
}

/// Outcome of a DISCARD exchange.
#[derive(Debug, Clone, Serialize)]
pub struct DiscardResponse {
    /// Present iff the stream is exhausted
    pub summary: Option<ResultSummary>,
    /// Whether more records remain on the server
    pub has_more: bool,
}

/// Outcome of a COMMIT exchange.
#[derive(Debug, Clone, Serialize)]
pub struct CommitResponse {
    /// Bookmark marking the committed transaction in the server's history
    pub bookmark: Option<String>,
}

impl CommitResponse {
    /// Extract from a COMMIT SUCCESS.
    pub fn from_success(summary: &SuccessMessage) -> Self {
        Self {
            bookmark: summary.bookmark().map(str::to_string),
        }
    }
}

/// Summary of an exhausted result stream.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    /// Update counters; all zero when the server reported no statistics
    pub counters: SummaryCounters,
    /// Bookmark for causal chaining
    pub bookmark: Option<String>,
    /// Database the result came from
    pub database: Option<String>,
    /// Milliseconds until the result was consumed
    pub result_consumed_after: Option<i64>,
}

impl ResultSummary {
    /// Extract from the final PULL/DISCARD SUCCESS.
    pub fn from_success(summary: &SuccessMessage) -> Self {
        let counters = summary
            .stats()
            .map(SummaryCounters::from_stats)
            .unwrap_or_default();
        Self {
            counters,
            bookmark: summary.bookmark().map(str::to_string),
            database: summary.db().map(str::to_string),
            result_consumed_after: summary.t_last(),
        }
    }
}

/// Write-operation counters reported with a result summary. Counters the
/// server does not report default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounters {
    /// Nodes created
    pub nodes_created: i64,
    /// Nodes deleted
    pub nodes_deleted: i64,
    /// Relationships created
    pub relationships_created: i64,
    /// Relationships deleted
    pub relationships_deleted: i64,
    /// Properties set
    pub properties_set: i64,
    /// Labels added
    pub labels_added: i64,
    /// Labels removed
    pub labels_removed: i64,
    /// Indexes added
    pub indexes_added: i64,
    /// Indexes removed
    pub indexes_removed: i64,
    /// Constraints added
    pub constraints_added: i64,
    /// Constraints removed
    pub constraints_removed: i64,
    /// System updates
    pub system_updates: i64,
    /// Whether the server flagged the result as containing updates
    pub contains_updates: bool,
    /// Whether the server flagged the result as containing system updates
    pub contains_system_updates: bool,
}

impl SummaryCounters {
    /// Parse the `stats` metadata map of a SUCCESS message.
    pub fn from_stats(
        stats: &std::collections::HashMap<String, crate::bolt::PackStreamValue>,
    ) -> Self {
        let int = |key: &str| stats.get(key).and_then(|v| v.as_int()).unwrap_or(0);
        let flag = |key: &str| stats.get(key).and_then(|v| v.as_bool()).unwrap_or(false);
        Self {
            nodes_created: int("nodes-created"),
            nodes_deleted: int("nodes-deleted"),
            relationships_created: int("relationships-created"),
            relationships_deleted: int("relationships-deleted"),
            properties_set: int("properties-set"),
            labels_added: int("labels-added"),
            labels_removed: int("labels-removed"),
            indexes_added: int("indexes-added"),
            indexes_removed: int("indexes-removed"),
            constraints_added: int("constraints-added"),
            constraints_removed: int("constraints-removed"),
            system_updates: int("system-updates"),
            contains_updates: flag("contains-updates"),
            contains_system_updates: flag("contains-system-updates"),
        }
    }

    /// Whether anything was modified.
    pub fn contains_updates(&self) -> bool {
        self.contains_updates || self.contains_system_updates || self.total_count() > 0
    }

    /// Sum of all update counters.
    pub fn total_count(&self) -> i64 {
        self.nodes_created
            + self.nodes_deleted
            + self.relationships_created
            + self.relationships_deleted
            + self.properties_set
            + self.labels_added
            + self.labels_removed
            + self.indexes_added
            + self.indexes_removed
            + self.constraints_added
            + self.constraints_removed
            + self.system_updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::PackStreamValue;
    use std::collections::HashMap;

    #[test]
    fn record_access() {
        let record = Record::new(vec![Value::Integer(1), Value::from("x")]);
        assert_eq!(record.len(), 2);
        assert!(!record.is_empty());
        assert_eq!(record.get(0).unwrap().as_int().unwrap(), 1);
        assert_eq!(record.get(1).unwrap().as_string().unwrap(), "x");
        assert!(record.get(2).is_none());
        assert_eq!(record.into_values().len(), 2);
    }

    #[test]
    fn run_response_from_success() {
        let success = SuccessMessage::run_success(vec!["a".into(), "b".into()], Some(7));
        let response = RunResponse::from_success(&success);
        assert_eq!(response.query_id, Some(7));
        assert_eq!(response.keys, vec!["a", "b"]);
        assert_eq!(response.result_available_after, None);
    }

    #[test]
    fn commit_response_from_success() {
        let success = SuccessMessage::commit_success("bm:9".to_string());
        assert_eq!(
            CommitResponse::from_success(&success).bookmark.as_deref(),
            Some("bm:9")
        );

        let empty = SuccessMessage::new();
        assert!(CommitResponse::from_success(&empty).bookmark.is_none());
    }

    #[test]
    fn counters_default_to_zero() {
        let summary = ResultSummary::from_success(&SuccessMessage::new());
        assert_eq!(summary.counters, SummaryCounters::default());
        assert_eq!(summary.counters.total_count(), 0);
        assert!(!summary.counters.contains_updates());
    }

    #[test]
    fn counters_parse_hyphenated_keys() {
        let mut stats = HashMap::new();
        stats.insert("nodes-created".to_string(), PackStreamValue::Integer(3));
        stats.insert("properties-set".to_string(), PackStreamValue::Integer(2));
        stats.insert("contains-updates".to_string(), PackStreamValue::Boolean(true));

        let counters = SummaryCounters::from_stats(&stats);
        assert_eq!(counters.nodes_created, 3);
        assert_eq!(counters.properties_set, 2);
        assert_eq!(counters.nodes_deleted, 0);
        assert!(counters.contains_updates);
        assert_eq!(counters.total_count(), 5);
    }

    #[test]
    fn contains_updates_from_counters_alone() {
        let mut stats = HashMap::new();
        stats.insert("labels-added".to_string(), PackStreamValue::Integer(1));
        let counters = SummaryCounters::from_stats(&stats);
        assert!(counters.contains_updates());
    }

    #[test]
    fn result_summary_carries_stream_metadata() {
        let mut success = SuccessMessage::new();
        success.add("bookmark", PackStreamValue::String("bm:1".into()));
        success.add("db", PackStreamValue::String("movies".into()));
        success.add("t_last", PackStreamValue::Integer(12));

        let summary = ResultSummary::from_success(&success);
        assert_eq!(summary.bookmark.as_deref(), Some("bm:1"));
        assert_eq!(summary.database.as_deref(), Some("movies"));
        assert_eq!(summary.result_consumed_after, Some(12));
    }
}
