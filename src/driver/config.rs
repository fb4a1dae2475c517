//! Connection configuration boundary.
//!
//! These types are the driver's interface to whatever URL-parsing or
//! configuration layer sits above it. The driver consumes a finished
//! [`ConnectionConfig`]; it never parses connection URIs beyond the
//! scheme-stripping in [`ServerAddress::from_uri`].

use std::fmt;
use std::time::Duration;

use crate::bolt::AuthToken;

use super::error::{DriverError, DriverResult};

/// Network address of a Bolt server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    /// Host name or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl ServerAddress {
    /// Create an address from host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse a `bolt://host:port` style URI. The `+s` and `+ssc` scheme
    /// variants are accepted; which [`super::SecurityPlan`] they select is
    /// decided by the configuration layer, not here.
    pub fn from_uri(uri: &str) -> DriverResult<Self> {
        let uri = uri
            .trim_start_matches("bolt://")
            .trim_start_matches("bolt+s://")
            .trim_start_matches("bolt+ssc://");

        let parts: Vec<&str> = uri.split(':').collect();
        match parts.len() {
            1 if !parts[0].is_empty() => Ok(Self::new(parts[0], 7687)),
            2 => {
                let port = parts[1]
                    .parse()
                    .map_err(|_| DriverError::configuration(format!("invalid port in {}", uri)))?;
                Ok(Self::new(parts[0], port))
            }
            _ => Err(DriverError::configuration(format!(
                "invalid server address: {}",
                uri
            ))),
        }
    }

    /// The `host:port` form used for socket connection.
    pub fn to_socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::new("localhost", 7687)
    }
}

/// Everything a [`super::Connection`] needs to establish itself.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address
    pub address: ServerAddress,
    /// Authentication token sent in HELLO
    pub auth: AuthToken,
    /// Target database; the server default when absent
    pub database: Option<String>,
    /// User agent string sent in HELLO
    pub user_agent: String,
    /// Default number of records per PULL
    pub fetch_size: i64,
    /// Initial per-response read timeout; mutable on the connection later
    pub read_timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Create a configuration with defaults for everything but the target.
    pub fn new(address: ServerAddress, auth: AuthToken) -> Self {
        Self {
            address,
            auth,
            database: None,
            user_agent: format!("graphbolt-driver/{}", env!("CARGO_PKG_VERSION")),
            fetch_size: 1000,
            read_timeout: None,
        }
    }

    /// Start a builder.
    pub fn builder(address: ServerAddress, auth: AuthToken) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder {
            config: Self::new(address, auth),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(ServerAddress::default(), AuthToken::none())
    }
}

/// Builder for [`ConnectionConfig`].
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Set the target database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.config.database = Some(database.into());
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the default number of records per PULL.
    pub fn with_fetch_size(mut self, fetch_size: i64) -> Self {
        self.config.fetch_size = fetch_size;
        self
    }

    /// Set the per-response read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    /// Finish the builder.
    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}
