//! # graphbolt-driver
//!
//! An asynchronous Rust client driver for graph databases speaking the
//! Bolt binary wire protocol.
//!
//! ## Features
//!
//! - **Bolt protocol 5.x** - version negotiation, chunked framing and
//!   the full PackStream value format
//! - **Pipelined exchanges** - every operation submits without blocking
//!   and returns a handle; batched messages share one network round trip
//! - **Typed values** - a closed value model carrying graph entities
//!   (nodes, relationships, paths) and temporal/spatial scalars
//!   losslessly across the wire
//! - **TLS security plans** - system CA, custom CA or trust-all trust
//!   configurations with configurable revocation checking
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use graphbolt_driver::{
//!     AuthToken, Connection, ConnectionConfig, SecurityPlan, ServerAddress,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConnectionConfig::builder(
//!         ServerAddress::new("localhost", 7687),
//!         AuthToken::basic("neo", "secret"),
//!     )
//!     .with_database("movies")
//!     .build();
//!
//!     let mut connection = Connection::connect(&config, &SecurityPlan::insecure()).await?;
//!
//!     // RUN and PULL coalesce into a single network flush.
//!     let run = connection
//!         .run(
//!             "MATCH (n:Person {name: $name}) RETURN n",
//!             graphbolt_driver::params! {"name" => "Alice"},
//!             false,
//!         )
//!         .await?;
//!     let pull = connection.pull(1000).await?;
//!
//!     let columns = run.await?;
//!     println!("columns: {:?}", columns.keys);
//!
//!     let result = pull.await?;
//!     for record in &result.records {
//!         let node = record.get(0).unwrap().as_node()?;
//!         println!("{} ({:?})", node.element_id, node.labels);
//!     }
//!
//!     connection.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Transactions
//!
//! Explicit transactions bracket any number of RUN/PULL exchanges, with
//! several result streams open at once when needed:
//!
//! ```rust,no_run
//! # use graphbolt_driver::{AuthToken, Connection, ConnectionConfig, SecurityPlan, ServerAddress};
//! # use graphbolt_driver::bolt::{AccessMode, TransactionType};
//! # async fn example(connection: &mut Connection) -> Result<(), Box<dyn std::error::Error>> {
//! let begin = connection
//!     .begin_transaction(
//!         vec![],                    // bookmarks
//!         Default::default(),        // tx metadata
//!         AccessMode::Write,
//!         TransactionType::Default,
//!         false,
//!     )
//!     .await?;
//! let run = connection.run("CREATE (n:Person {id: 1})", Default::default(), false).await?;
//! let pull = connection.pull(-1).await?;   // flushes BEGIN + RUN + PULL together
//!
//! begin.await?;
//! run.await?;
//! let summary = pull.await?.summary.unwrap();
//! assert_eq!(summary.counters.nodes_created, 1);
//!
//! let commit = connection.commit().await?;
//! println!("bookmark: {:?}", commit.await?.bookmark);
//! # Ok(())
//! # }
//! ```

pub mod bolt;
pub mod driver;

// Re-exports
pub use bolt::{AccessMode, AuthToken, BoltVersion, TransactionType};
pub use driver::{
    BoltAgent, CommitResponse, Connection, ConnectionConfig, ConnectionConfigBuilder,
    DiscardResponse, DriverError, DriverResult, Duration, Node, Path, PathElement, Point,
    PullResponse, Record, Relationship, ResponseHandle, ResultSummary, RevocationCheckingStrategy,
    RunResponse, SecurityPlan, Segment, ServerAddress, SessionState, SummaryCounters,
    UnsupportedDateTime, Value,
};

/// Build a query parameter map.
///
/// ```
/// let params = graphbolt_driver::params! {
///     "name" => "Alice",
///     "age" => 30,
/// };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        std::collections::HashMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert($key.to_string(), $crate::driver::Value::from($value));
        )+
        map
    }};
}
