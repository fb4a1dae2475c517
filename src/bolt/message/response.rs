//! Bolt protocol response messages.
//!
//! Response messages are sent from the server to the client. Every request
//! is answered by exactly one summary message (SUCCESS, FAILURE or
//! IGNORED); streaming requests additionally yield zero or more RECORD
//! messages before their summary.

use std::collections::HashMap;

use super::tag;
use crate::bolt::packstream::{PackStreamError, PackStreamStructure, PackStreamValue};

/// All Bolt response messages.
#[derive(Debug, Clone)]
pub enum BoltResponse {
    /// SUCCESS - the request completed
    Success(SuccessMessage),
    /// RECORD - one row of a streamed result
    Record(RecordMessage),
    /// FAILURE - the request failed
    Failure(FailureMessage),
    /// IGNORED - the request was skipped because the connection is in a
    /// failed state
    Ignored,
}

impl BoltResponse {
    /// Message tag byte.
    pub fn tag(&self) -> u8 {
        match self {
            BoltResponse::Success(_) => tag::SUCCESS,
            BoltResponse::Record(_) => tag::RECORD,
            BoltResponse::Failure(_) => tag::FAILURE,
            BoltResponse::Ignored => tag::IGNORED,
        }
    }

    /// Message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltResponse::Success(_) => "SUCCESS",
            BoltResponse::Record(_) => "RECORD",
            BoltResponse::Failure(_) => "FAILURE",
            BoltResponse::Ignored => "IGNORED",
        }
    }

    /// Whether this is a SUCCESS.
    pub fn is_success(&self) -> bool {
        matches!(self, BoltResponse::Success(_))
    }

    /// Whether this is a RECORD.
    pub fn is_record(&self) -> bool {
        matches!(self, BoltResponse::Record(_))
    }

    /// Whether this is a FAILURE.
    pub fn is_failure(&self) -> bool {
        matches!(self, BoltResponse::Failure(_))
    }

    /// Convert to the PackStream structure form.
    pub fn to_structure(&self) -> PackStreamStructure {
        match self {
            BoltResponse::Success(msg) => msg.to_structure(),
            BoltResponse::Record(msg) => msg.to_structure(),
            BoltResponse::Failure(msg) => msg.to_structure(),
            BoltResponse::Ignored => PackStreamStructure::new(tag::IGNORED, vec![]),
        }
    }

    /// Parse from the PackStream structure form.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        match s.tag {
            tag::SUCCESS => Ok(BoltResponse::Success(SuccessMessage::from_structure(s)?)),
            tag::RECORD => Ok(BoltResponse::Record(RecordMessage::from_structure(s)?)),
            tag::FAILURE => Ok(BoltResponse::Failure(FailureMessage::from_structure(s)?)),
            tag::IGNORED => Ok(BoltResponse::Ignored),
            _ => Err(PackStreamError::InvalidStructure(format!(
                "unknown response message tag 0x{:02X}",
                s.tag
            ))),
        }
    }
}

/// SUCCESS - a request completed; metadata depends on the request kind.
#[derive(Debug, Clone, Default)]
pub struct SuccessMessage {
    /// Response metadata
    pub metadata: HashMap<String, PackStreamValue>,
}

impl SuccessMessage {
    /// Create a SUCCESS with empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a SUCCESS with the given metadata.
    pub fn with_metadata(metadata: HashMap<String, PackStreamValue>) -> Self {
        Self { metadata }
    }

    /// Insert a metadata entry.
    pub fn add(&mut self, key: &str, value: PackStreamValue) {
        self.metadata.insert(key.to_string(), value);
    }

    /// Look up a metadata entry.
    pub fn get(&self, key: &str) -> Option<&PackStreamValue> {
        self.metadata.get(key)
    }

    /// Server agent string (HELLO success).
    pub fn server(&self) -> Option<&str> {
        self.metadata.get("server").and_then(|v| v.as_str())
    }

    /// Connection id assigned by the server (HELLO success).
    pub fn connection_id(&self) -> Option<&str> {
        self.metadata.get("connection_id").and_then(|v| v.as_str())
    }

    /// Result field names (RUN success).
    pub fn fields(&self) -> Option<Vec<String>> {
        self.metadata.get("fields").and_then(|v| v.as_string_list())
    }

    /// Query id for multi-result transactions (RUN success).
    pub fn qid(&self) -> Option<i64> {
        self.metadata.get("qid").and_then(|v| v.as_int())
    }

    /// Milliseconds until the result was available (RUN success).
    pub fn t_first(&self) -> Option<i64> {
        self.metadata.get("t_first").and_then(|v| v.as_int())
    }

    /// Milliseconds until the result was consumed (PULL/DISCARD success).
    pub fn t_last(&self) -> Option<i64> {
        self.metadata.get("t_last").and_then(|v| v.as_int())
    }

    /// Whether more records remain in the stream (PULL/DISCARD success).
    pub fn has_more(&self) -> bool {
        self.metadata
            .get("has_more")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Bookmark for causal chaining (COMMIT and final PULL successes).
    pub fn bookmark(&self) -> Option<&str> {
        self.metadata.get("bookmark").and_then(|v| v.as_str())
    }

    /// Database the result came from.
    pub fn db(&self) -> Option<&str> {
        self.metadata.get("db").and_then(|v| v.as_str())
    }

    /// Update statistics (final PULL/DISCARD success).
    pub fn stats(&self) -> Option<&HashMap<String, PackStreamValue>> {
        self.metadata.get("stats").and_then(|v| v.as_map())
    }

    /// Build a RUN success.
    pub fn run_success(fields: Vec<String>, qid: Option<i64>) -> Self {
        let mut msg = Self::new();
        msg.add(
            "fields",
            PackStreamValue::List(fields.into_iter().map(PackStreamValue::String).collect()),
        );
        if let Some(qid) = qid {
            msg.add("qid", PackStreamValue::Integer(qid));
        }
        msg
    }

    /// Build a PULL/DISCARD success.
    pub fn streaming_success(has_more: bool, bookmark: Option<String>) -> Self {
        let mut msg = Self::new();
        if has_more {
            msg.add("has_more", PackStreamValue::Boolean(true));
        }
        if let Some(bm) = bookmark {
            msg.add("bookmark", PackStreamValue::String(bm));
        }
        msg
    }

    /// Build a COMMIT success.
    pub fn commit_success(bookmark: String) -> Self {
        let mut msg = Self::new();
        msg.add("bookmark", PackStreamValue::String(bookmark));
        msg
    }

    /// Convert to the PackStream structure form.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(
            tag::SUCCESS,
            vec![PackStreamValue::Map(self.metadata.clone())],
        )
    }

    /// Parse from the PackStream structure form.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        if s.tag != tag::SUCCESS {
            return Err(PackStreamError::InvalidStructure(
                "expected SUCCESS tag".into(),
            ));
        }
        let metadata = s
            .fields
            .first()
            .and_then(|v| v.as_map())
            .cloned()
            .unwrap_or_default();
        Ok(Self { metadata })
    }
}

/// RECORD - one row of a streamed result.
#[derive(Debug, Clone, Default)]
pub struct RecordMessage {
    /// Field values, positionally aligned with the RUN success `fields`
    pub fields: Vec<PackStreamValue>,
}

impl RecordMessage {
    /// Create a record from field values.
    pub fn new(fields: Vec<PackStreamValue>) -> Self {
        Self { fields }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field value at `index`.
    pub fn get(&self, index: usize) -> Option<&PackStreamValue> {
        self.fields.get(index)
    }

    /// Convert to the PackStream structure form.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(
            tag::RECORD,
            vec![PackStreamValue::List(self.fields.clone())],
        )
    }

    /// Parse from the PackStream structure form.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        if s.tag != tag::RECORD {
            return Err(PackStreamError::InvalidStructure(
                "expected RECORD tag".into(),
            ));
        }
        let fields = match s.fields.first() {
            Some(PackStreamValue::List(list)) => list.clone(),
            Some(_) => {
                return Err(PackStreamError::InvalidStructure(
                    "RECORD fields must be a list".into(),
                ))
            }
            None => Vec::new(),
        };
        Ok(Self { fields })
    }
}

/// FAILURE - a request failed; carries a structured error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMessage {
    /// Structured error code, e.g. "Neo.ClientError.Statement.SyntaxError"
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl FailureMessage {
    /// Create a failure message.
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether the code classifies as a client error.
    pub fn is_client_error(&self) -> bool {
        self.code.contains("ClientError")
    }

    /// Whether the code classifies as transient (retry may succeed).
    pub fn is_transient(&self) -> bool {
        self.code.contains("TransientError")
    }

    /// Whether the code classifies as an authentication failure.
    pub fn is_authentication_error(&self) -> bool {
        self.code.contains("Security") || self.code.contains("Authentication")
    }

    /// Convert to the PackStream structure form.
    pub fn to_structure(&self) -> PackStreamStructure {
        let mut metadata = HashMap::new();
        metadata.insert("code".to_string(), PackStreamValue::String(self.code.clone()));
        metadata.insert(
            "message".to_string(),
            PackStreamValue::String(self.message.clone()),
        );
        PackStreamStructure::new(tag::FAILURE, vec![PackStreamValue::Map(metadata)])
    }

    /// Parse from the PackStream structure form.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        if s.tag != tag::FAILURE {
            return Err(PackStreamError::InvalidStructure(
                "expected FAILURE tag".into(),
            ));
        }
        let metadata = s.fields.first().and_then(|v| v.as_map()).ok_or_else(|| {
            PackStreamError::InvalidStructure("FAILURE requires a metadata map".into())
        })?;

        let code = metadata
            .get("code")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PackStreamError::InvalidStructure("FAILURE requires a code".into()))?
            .to_string();
        let message = metadata
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(Self { code, message })
    }
}

impl std::fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_roundtrip() {
        let mut msg = SuccessMessage::new();
        msg.add("server", PackStreamValue::String("GraphDB/5.0".into()));
        msg.add("connection_id", PackStreamValue::String("bolt-17".into()));

        let parsed = SuccessMessage::from_structure(&msg.to_structure()).unwrap();
        assert_eq!(parsed.server(), Some("GraphDB/5.0"));
        assert_eq!(parsed.connection_id(), Some("bolt-17"));
    }

    #[test]
    fn run_success_metadata() {
        let msg = SuccessMessage::run_success(vec!["n".to_string(), "m".to_string()], Some(2));
        assert_eq!(msg.fields().unwrap(), vec!["n", "m"]);
        assert_eq!(msg.qid(), Some(2));
        assert_eq!(msg.t_first(), None);
    }

    #[test]
    fn streaming_success_metadata() {
        let msg = SuccessMessage::streaming_success(true, Some("bm:42".to_string()));
        assert!(msg.has_more());
        assert_eq!(msg.bookmark(), Some("bm:42"));

        let done = SuccessMessage::streaming_success(false, None);
        assert!(!done.has_more());
        assert!(done.bookmark().is_none());
    }

    #[test]
    fn commit_success_metadata() {
        let msg = SuccessMessage::commit_success("bm:commit:9".to_string());
        assert_eq!(msg.bookmark(), Some("bm:commit:9"));
    }

    #[test]
    fn record_roundtrip() {
        let msg = RecordMessage::new(vec![
            PackStreamValue::String("Alice".into()),
            PackStreamValue::Integer(30),
        ]);
        assert_eq!(msg.len(), 2);
        assert!(!msg.is_empty());

        let parsed = RecordMessage::from_structure(&msg.to_structure()).unwrap();
        assert_eq!(parsed.get(0).unwrap().as_str(), Some("Alice"));
        assert_eq!(parsed.get(1).unwrap().as_int(), Some(30));
        assert!(parsed.get(2).is_none());
    }

    #[test]
    fn failure_roundtrip() {
        let msg = FailureMessage::new("Neo.ClientError.Statement.SyntaxError", "bad query");
        assert!(msg.is_client_error());
        assert!(!msg.is_transient());

        let parsed = FailureMessage::from_structure(&msg.to_structure()).unwrap();
        assert_eq!(parsed, msg);
        assert!(parsed.to_string().contains("SyntaxError"));
    }

    #[test]
    fn failure_classification() {
        assert!(
            FailureMessage::new("Neo.ClientError.Security.Unauthorized", "")
                .is_authentication_error()
        );
        assert!(
            FailureMessage::new("Neo.TransientError.General.DatabaseUnavailable", "")
                .is_transient()
        );
        assert!(!FailureMessage::new("Neo.DatabaseError.General.UnknownError", "")
            .is_client_error());
    }

    #[test]
    fn response_dispatch() {
        let responses = vec![
            BoltResponse::Success(SuccessMessage::new()),
            BoltResponse::Record(RecordMessage::default()),
            BoltResponse::Failure(FailureMessage::new("Neo.ClientError.X.Y", "boom")),
            BoltResponse::Ignored,
        ];
        for response in responses {
            let parsed = BoltResponse::from_structure(&response.to_structure()).unwrap();
            assert_eq!(parsed.tag(), response.tag());
            assert_eq!(parsed.name(), response.name());
        }
    }

    #[test]
    fn response_predicates() {
        assert!(BoltResponse::Success(SuccessMessage::new()).is_success());
        assert!(BoltResponse::Record(RecordMessage::default()).is_record());
        assert!(BoltResponse::Failure(FailureMessage::new("c", "m")).is_failure());
        assert!(!BoltResponse::Ignored.is_success());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let s = PackStreamStructure::new(0x10, vec![]);
        assert!(BoltResponse::from_structure(&s).is_err());
    }
}
