//! Bolt protocol request messages.
//!
//! Request messages are sent from the client to the server. Each message
//! converts to and from its PackStream structure form; parsing is used by
//! the test harness, which plays the server side of the exchange.

use std::collections::HashMap;
use std::time::Duration;

use super::tag;
use crate::bolt::packstream::{PackStreamError, PackStreamStructure, PackStreamValue};

/// Access mode requested for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Read-write access (default)
    #[default]
    Write,
    /// Read-only access
    Read,
}

impl AccessMode {
    /// Parse the wire form.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "r" => AccessMode::Read,
            _ => AccessMode::Write,
        }
    }

    /// Wire form used in message metadata.
    pub fn as_wire(&self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
        }
    }
}

/// The kind of transaction a BEGIN opens.
///
/// This never reaches the wire; it is carried so the connection can keep
/// per-transaction bookkeeping without inspecting queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionType {
    /// Plain transaction (default)
    #[default]
    Default,
    /// Transaction not bound to a specific result-consumption pattern
    Unconstrained,
}

/// Authentication token carried in HELLO.
#[derive(Debug, Clone)]
pub struct AuthToken {
    /// Authentication scheme ("basic", "bearer", "none")
    pub scheme: String,
    /// Principal (username)
    pub principal: Option<String>,
    /// Credentials (password or token)
    pub credentials: Option<String>,
    /// Realm
    pub realm: Option<String>,
}

impl AuthToken {
    /// Username/password authentication.
    pub fn basic(principal: &str, credentials: &str) -> Self {
        Self {
            scheme: "basic".to_string(),
            principal: Some(principal.to_string()),
            credentials: Some(credentials.to_string()),
            realm: None,
        }
    }

    /// Bearer token authentication.
    pub fn bearer(token: &str) -> Self {
        Self {
            scheme: "bearer".to_string(),
            principal: None,
            credentials: Some(token.to_string()),
            realm: None,
        }
    }

    /// No authentication.
    pub fn none() -> Self {
        Self {
            scheme: "none".to_string(),
            principal: None,
            credentials: None,
            realm: None,
        }
    }

    /// Convert to the HELLO metadata entries.
    pub fn to_map(&self) -> HashMap<String, PackStreamValue> {
        let mut map = HashMap::new();
        map.insert(
            "scheme".to_string(),
            PackStreamValue::String(self.scheme.clone()),
        );
        if let Some(ref p) = self.principal {
            map.insert("principal".to_string(), PackStreamValue::String(p.clone()));
        }
        if let Some(ref c) = self.credentials {
            map.insert(
                "credentials".to_string(),
                PackStreamValue::String(c.clone()),
            );
        }
        if let Some(ref r) = self.realm {
            map.insert("realm".to_string(), PackStreamValue::String(r.clone()));
        }
        map
    }

    /// Parse from HELLO metadata entries.
    pub fn from_map(map: &HashMap<String, PackStreamValue>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| v.as_str()).map(str::to_string);
        Self {
            scheme: get("scheme").unwrap_or_else(|| "none".to_string()),
            principal: get("principal"),
            credentials: get("credentials"),
            realm: get("realm"),
        }
    }
}

impl Default for AuthToken {
    fn default() -> Self {
        Self::none()
    }
}

/// All Bolt request messages.
#[derive(Debug, Clone)]
pub enum BoltRequest {
    /// HELLO - initialize and authenticate the connection
    Hello(HelloMessage),
    /// GOODBYE - close the connection gracefully
    Goodbye,
    /// RESET - abandon any open transaction and return to idle
    Reset,
    /// RUN - submit a query
    Run(RunMessage),
    /// BEGIN - open an explicit transaction
    Begin(BeginMessage),
    /// COMMIT - commit the open transaction
    Commit,
    /// ROLLBACK - roll back the open transaction
    Rollback,
    /// PULL - stream records of a result
    Pull(PullMessage),
    /// DISCARD - drop records of a result without streaming them
    Discard(DiscardMessage),
}

impl BoltRequest {
    /// Message tag byte.
    pub fn tag(&self) -> u8 {
        match self {
            BoltRequest::Hello(_) => tag::HELLO,
            BoltRequest::Goodbye => tag::GOODBYE,
            BoltRequest::Reset => tag::RESET,
            BoltRequest::Run(_) => tag::RUN,
            BoltRequest::Begin(_) => tag::BEGIN,
            BoltRequest::Commit => tag::COMMIT,
            BoltRequest::Rollback => tag::ROLLBACK,
            BoltRequest::Pull(_) => tag::PULL,
            BoltRequest::Discard(_) => tag::DISCARD,
        }
    }

    /// Message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltRequest::Hello(_) => "HELLO",
            BoltRequest::Goodbye => "GOODBYE",
            BoltRequest::Reset => "RESET",
            BoltRequest::Run(_) => "RUN",
            BoltRequest::Begin(_) => "BEGIN",
            BoltRequest::Commit => "COMMIT",
            BoltRequest::Rollback => "ROLLBACK",
            BoltRequest::Pull(_) => "PULL",
            BoltRequest::Discard(_) => "DISCARD",
        }
    }

    /// Convert to the PackStream structure form.
    pub fn to_structure(&self) -> PackStreamStructure {
        match self {
            BoltRequest::Hello(msg) => msg.to_structure(),
            BoltRequest::Goodbye => PackStreamStructure::new(tag::GOODBYE, vec![]),
            BoltRequest::Reset => PackStreamStructure::new(tag::RESET, vec![]),
            BoltRequest::Run(msg) => msg.to_structure(),
            BoltRequest::Begin(msg) => msg.to_structure(),
            BoltRequest::Commit => PackStreamStructure::new(tag::COMMIT, vec![]),
            BoltRequest::Rollback => PackStreamStructure::new(tag::ROLLBACK, vec![]),
            BoltRequest::Pull(msg) => msg.to_structure(),
            BoltRequest::Discard(msg) => msg.to_structure(),
        }
    }

    /// Parse from the PackStream structure form.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        match s.tag {
            tag::HELLO => Ok(BoltRequest::Hello(HelloMessage::from_structure(s)?)),
            tag::GOODBYE => Ok(BoltRequest::Goodbye),
            tag::RESET => Ok(BoltRequest::Reset),
            tag::RUN => Ok(BoltRequest::Run(RunMessage::from_structure(s)?)),
            tag::BEGIN => Ok(BoltRequest::Begin(BeginMessage::from_structure(s)?)),
            tag::COMMIT => Ok(BoltRequest::Commit),
            tag::ROLLBACK => Ok(BoltRequest::Rollback),
            tag::PULL => Ok(BoltRequest::Pull(PullMessage::from_structure(s)?)),
            tag::DISCARD => Ok(BoltRequest::Discard(DiscardMessage::from_structure(s)?)),
            _ => Err(PackStreamError::InvalidStructure(format!(
                "unknown request message tag 0x{:02X}",
                s.tag
            ))),
        }
    }
}

/// HELLO - initialize and authenticate the connection.
#[derive(Debug, Clone)]
pub struct HelloMessage {
    /// User agent string, e.g. "graphbolt-driver/0.1.0"
    pub user_agent: String,
    /// Authentication token
    pub auth: AuthToken,
    /// Driver/platform identification map (product, platform, language,
    /// language_details)
    pub bolt_agent: HashMap<String, PackStreamValue>,
}

impl HelloMessage {
    /// Create a HELLO message.
    pub fn new(user_agent: &str, auth: AuthToken) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            auth,
            bolt_agent: HashMap::new(),
        }
    }

    /// Attach the bolt agent identification map.
    pub fn with_bolt_agent(mut self, bolt_agent: HashMap<String, PackStreamValue>) -> Self {
        self.bolt_agent = bolt_agent;
        self
    }

    /// Convert to the PackStream structure form.
    pub fn to_structure(&self) -> PackStreamStructure {
        let mut extra = self.auth.to_map();
        extra.insert(
            "user_agent".to_string(),
            PackStreamValue::String(self.user_agent.clone()),
        );
        if !self.bolt_agent.is_empty() {
            extra.insert(
                "bolt_agent".to_string(),
                PackStreamValue::Map(self.bolt_agent.clone()),
            );
        }
        PackStreamStructure::new(tag::HELLO, vec![PackStreamValue::Map(extra)])
    }

    /// Parse from the PackStream structure form.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        if s.tag != tag::HELLO {
            return Err(PackStreamError::InvalidStructure("expected HELLO tag".into()));
        }
        let extra = s
            .fields
            .first()
            .and_then(|v| v.as_map())
            .ok_or_else(|| PackStreamError::InvalidStructure("HELLO requires an extra map".into()))?;

        let user_agent = extra
            .get("user_agent")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let auth = AuthToken::from_map(extra);
        let bolt_agent = extra
            .get("bolt_agent")
            .and_then(|v| v.as_map())
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            user_agent,
            auth,
            bolt_agent,
        })
    }
}

/// RUN - submit a query with parameters.
#[derive(Debug, Clone)]
pub struct RunMessage {
    /// Query text, forwarded verbatim
    pub query: String,
    /// Query parameters
    pub parameters: HashMap<String, PackStreamValue>,
    /// Extra metadata (db, bookmarks, mode, tx_metadata)
    pub extra: HashMap<String, PackStreamValue>,
}

impl RunMessage {
    /// Create a RUN message.
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            parameters: HashMap::new(),
            extra: HashMap::new(),
        }
    }

    /// Set query parameters.
    pub fn with_parameters(mut self, params: HashMap<String, PackStreamValue>) -> Self {
        self.parameters = params;
        self
    }

    /// Set the target database.
    pub fn with_database(mut self, db: &str) -> Self {
        self.extra
            .insert("db".to_string(), PackStreamValue::String(db.to_string()));
        self
    }

    /// Set the bookmarks this query waits on.
    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        if !bookmarks.is_empty() {
            self.extra.insert(
                "bookmarks".to_string(),
                PackStreamValue::List(bookmarks.into_iter().map(PackStreamValue::String).collect()),
            );
        }
        self
    }

    /// Set the access mode.
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        if mode == AccessMode::Read {
            self.extra
                .insert("mode".to_string(), PackStreamValue::String("r".to_string()));
        }
        self
    }

    /// Convert to the PackStream structure form.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(
            tag::RUN,
            vec![
                PackStreamValue::String(self.query.clone()),
                PackStreamValue::Map(self.parameters.clone()),
                PackStreamValue::Map(self.extra.clone()),
            ],
        )
    }

    /// Parse from the PackStream structure form.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        if s.tag != tag::RUN {
            return Err(PackStreamError::InvalidStructure("expected RUN tag".into()));
        }
        if s.fields.len() < 2 {
            return Err(PackStreamError::InvalidStructure(
                "RUN requires query and parameters".into(),
            ));
        }

        let query = s.fields[0]
            .as_str()
            .ok_or_else(|| PackStreamError::InvalidStructure("RUN query must be a string".into()))?
            .to_string();
        let parameters = s.fields[1]
            .as_map()
            .ok_or_else(|| PackStreamError::InvalidStructure("RUN parameters must be a map".into()))?
            .clone();
        let extra = s
            .fields
            .get(2)
            .and_then(|v| v.as_map())
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            query,
            parameters,
            extra,
        })
    }
}

/// BEGIN - open an explicit transaction.
#[derive(Debug, Clone, Default)]
pub struct BeginMessage {
    /// Bookmarks this transaction waits on
    pub bookmarks: Vec<String>,
    /// Transaction timeout
    pub tx_timeout: Option<Duration>,
    /// Access mode
    pub mode: AccessMode,
    /// Target database
    pub database: Option<String>,
    /// Application metadata attached to the transaction
    pub tx_metadata: HashMap<String, PackStreamValue>,
}

impl BeginMessage {
    /// Create an empty BEGIN message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bookmarks.
    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    /// Set the transaction timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = Some(timeout);
        self
    }

    /// Set the access mode.
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the target database.
    pub fn with_database(mut self, db: &str) -> Self {
        self.database = Some(db.to_string());
        self
    }

    /// Set transaction metadata.
    pub fn with_metadata(mut self, metadata: HashMap<String, PackStreamValue>) -> Self {
        self.tx_metadata = metadata;
        self
    }

    /// Convert to the PackStream structure form.
    pub fn to_structure(&self) -> PackStreamStructure {
        let mut extra = HashMap::new();

        if !self.bookmarks.is_empty() {
            extra.insert(
                "bookmarks".to_string(),
                PackStreamValue::List(
                    self.bookmarks
                        .iter()
                        .map(|b| PackStreamValue::String(b.clone()))
                        .collect(),
                ),
            );
        }
        if let Some(timeout) = self.tx_timeout {
            extra.insert(
                "tx_timeout".to_string(),
                PackStreamValue::Integer(timeout.as_millis() as i64),
            );
        }
        if self.mode == AccessMode::Read {
            extra.insert("mode".to_string(), PackStreamValue::String("r".to_string()));
        }
        if let Some(ref db) = self.database {
            extra.insert("db".to_string(), PackStreamValue::String(db.clone()));
        }
        if !self.tx_metadata.is_empty() {
            extra.insert(
                "tx_metadata".to_string(),
                PackStreamValue::Map(self.tx_metadata.clone()),
            );
        }

        PackStreamStructure::new(tag::BEGIN, vec![PackStreamValue::Map(extra)])
    }

    /// Parse from the PackStream structure form.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        if s.tag != tag::BEGIN {
            return Err(PackStreamError::InvalidStructure("expected BEGIN tag".into()));
        }
        let extra = s
            .fields
            .first()
            .and_then(|v| v.as_map())
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            bookmarks: extra
                .get("bookmarks")
                .and_then(|v| v.as_string_list())
                .unwrap_or_default(),
            tx_timeout: extra
                .get("tx_timeout")
                .and_then(|v| v.as_int())
                .map(|ms| Duration::from_millis(ms.max(0) as u64)),
            mode: extra
                .get("mode")
                .and_then(|v| v.as_str())
                .map(AccessMode::from_wire)
                .unwrap_or_default(),
            database: extra.get("db").and_then(|v| v.as_str()).map(str::to_string),
            tx_metadata: extra
                .get("tx_metadata")
                .and_then(|v| v.as_map())
                .cloned()
                .unwrap_or_default(),
        })
    }
}

/// PULL - stream records of a result.
///
/// `n == -1` requests all remaining records; a non-negative `n` is an
/// exact cap. `qid` selects a specific open result stream; when absent the
/// message applies to the most recent RUN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullMessage {
    /// Number of records to stream, -1 for all
    pub n: i64,
    /// Query id of the targeted result stream
    pub qid: Option<i64>,
}

impl PullMessage {
    /// Pull all remaining records of the most recent result.
    pub fn all() -> Self {
        Self { n: -1, qid: None }
    }

    /// Pull up to `n` records of the most recent result.
    pub fn with_n(n: i64) -> Self {
        Self { n, qid: None }
    }

    /// Target an explicit result stream.
    pub fn with_qid(mut self, qid: i64) -> Self {
        self.qid = Some(qid);
        self
    }

    /// Convert to the PackStream structure form.
    pub fn to_structure(&self) -> PackStreamStructure {
        stream_request_structure(tag::PULL, self.n, self.qid)
    }

    /// Parse from the PackStream structure form.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        if s.tag != tag::PULL {
            return Err(PackStreamError::InvalidStructure("expected PULL tag".into()));
        }
        let (n, qid) = parse_stream_request(s);
        Ok(Self { n, qid })
    }
}

/// DISCARD - drop records of a result without streaming them.
///
/// Same count and query-id semantics as [`PullMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardMessage {
    /// Number of records to discard, -1 for all
    pub n: i64,
    /// Query id of the targeted result stream
    pub qid: Option<i64>,
}

impl DiscardMessage {
    /// Discard all remaining records of the most recent result.
    pub fn all() -> Self {
        Self { n: -1, qid: None }
    }

    /// Discard up to `n` records of the most recent result.
    pub fn with_n(n: i64) -> Self {
        Self { n, qid: None }
    }

    /// Target an explicit result stream.
    pub fn with_qid(mut self, qid: i64) -> Self {
        self.qid = Some(qid);
        self
    }

    /// Convert to the PackStream structure form.
    pub fn to_structure(&self) -> PackStreamStructure {
        stream_request_structure(tag::DISCARD, self.n, self.qid)
    }

    /// Parse from the PackStream structure form.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        if s.tag != tag::DISCARD {
            return Err(PackStreamError::InvalidStructure(
                "expected DISCARD tag".into(),
            ));
        }
        let (n, qid) = parse_stream_request(s);
        Ok(Self { n, qid })
    }
}

fn stream_request_structure(tag: u8, n: i64, qid: Option<i64>) -> PackStreamStructure {
    let mut extra = HashMap::new();
    extra.insert("n".to_string(), PackStreamValue::Integer(n));
    if let Some(qid) = qid {
        extra.insert("qid".to_string(), PackStreamValue::Integer(qid));
    }
    PackStreamStructure::new(tag, vec![PackStreamValue::Map(extra)])
}

fn parse_stream_request(s: &PackStreamStructure) -> (i64, Option<i64>) {
    match s.fields.first().and_then(|v| v.as_map()) {
        Some(extra) => (
            extra.get("n").and_then(|v| v.as_int()).unwrap_or(-1),
            extra.get("qid").and_then(|v| v.as_int()),
        ),
        None => (-1, None),
    }
}
