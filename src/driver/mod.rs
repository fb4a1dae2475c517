//! Driver level: value model, graph entities, security and the
//! connection protocol state machine.
//!
//! The [`Value`] sum type carries everything the wire can express,
//! including graph entities ([`Node`], [`Relationship`], [`Path`]) and
//! rich temporal/spatial scalars. [`adapter`] translates losslessly
//! between [`Value`] and the PackStream wire representation.
//! [`SecurityPlan`] fixes the TLS trust configuration once per driver,
//! and [`Connection`] drives the asynchronous, pipelined message
//! exchange against one server.
//!
//! # Example
//!
//! ```ignore
//! use graphbolt_driver::driver::{Connection, ConnectionConfig, SecurityPlan, ServerAddress};
//! use graphbolt_driver::bolt::AuthToken;
//!
//! let config = ConnectionConfig::new(
//!     ServerAddress::new("localhost", 7687),
//!     AuthToken::basic("neo", "secret"),
//! );
//! let mut connection = Connection::connect(&config, &SecurityPlan::insecure()).await?;
//!
//! // RUN + PULL pipelined into a single round trip
//! let run = connection.run("RETURN 1 AS one", Default::default(), false).await?;
//! let pull = connection.pull(1000).await?;
//! let result = pull.await?;
//! ```

pub mod adapter;
pub mod agent;
pub mod config;
pub mod connection;
pub mod error;
pub mod graph;
pub mod response;
pub mod security;
pub mod value;

pub use agent::BoltAgent;
pub use config::{ConnectionConfig, ConnectionConfigBuilder, ServerAddress};
pub use connection::{Connection, ResponseHandle, SessionState};
pub use error::{DriverError, DriverResult};
pub use graph::{Node, Path, PathElement, Relationship, Segment};
pub use response::{
    CommitResponse, DiscardResponse, PullResponse, Record, ResultSummary, RunResponse,
    SummaryCounters,
};
pub use security::{RevocationCheckingStrategy, SecurityPlan};
pub use value::{Duration, Point, UnsupportedDateTime, Value};
