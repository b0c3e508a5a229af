//! Client configuration.

use std::time::Duration;

/// Configuration for connecting to a DRDA server.
///
/// Marked `#[non_exhaustive]` so fields can be added without breaking
/// semver. Construct with [`Config::new()`] and the builder methods.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Server hostname or IP address.
    pub host: String,

    /// Server port (default: 50000).
    pub port: u16,

    /// Target database name.
    pub database: String,

    /// User ID for authentication.
    pub username: String,

    /// Password for authentication.
    pub password: String,

    /// Package collection name (default: `NULLID`).
    pub collection: String,

    /// Package name (default: `SYSSH200`).
    pub package: String,

    /// Client identity sent during the attribute exchange.
    pub client_name: String,

    /// Query block size requested per fetch (default: 32767).
    pub query_block_size: u32,

    /// Row cap per query; exceeding it sets `truncated` on the result
    /// (default: 10000).
    pub max_rows: usize,

    /// Time to establish the TCP connection (default: 15s).
    pub connect_timeout: Duration,

    /// Deadline for each reply read (default: 30s).
    pub read_timeout: Duration,

    /// Overall deadline for one operation, handshake included; bounds the
    /// whole fetch loop, not just each turn (default: none).
    pub operation_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 50000,
            database: String::new(),
            username: String::new(),
            password: String::new(),
            collection: "NULLID".to_owned(),
            package: "SYSSH200".to_owned(),
            client_name: "db2-client".to_owned(),
            query_block_size: 32_767,
            max_rows: 10_000,
            connect_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(30),
            operation_timeout: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the database name.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the credentials.
    #[must_use]
    pub fn credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the package collection name.
    #[must_use]
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the package name.
    #[must_use]
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Set the client identity string.
    #[must_use]
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Set the query block size requested per fetch.
    #[must_use]
    pub fn query_block_size(mut self, size: u32) -> Self {
        self.query_block_size = size;
        self
    }

    /// Set the row cap per query.
    #[must_use]
    pub fn max_rows(mut self, max: usize) -> Self {
        self.max_rows = max;
        self
    }

    /// Set the TCP connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-reply read deadline.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set an overall per-operation deadline.
    #[must_use]
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 50000);
        assert_eq!(config.collection, "NULLID");
        assert_eq!(config.package, "SYSSH200");
        assert_eq!(config.query_block_size, 32_767);
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert_eq!(config.operation_timeout, None);
    }

    #[test]
    fn test_builder_chain() {
        let config = Config::new()
            .host("db.example.com")
            .port(60000)
            .database("SAMPLE")
            .credentials("db2inst1", "secret")
            .max_rows(50)
            .read_timeout(Duration::from_secs(5));

        assert_eq!(config.host, "db.example.com");
        assert_eq!(config.port, 60000);
        assert_eq!(config.database, "SAMPLE");
        assert_eq!(config.username, "db2inst1");
        assert_eq!(config.max_rows, 50);
        assert_eq!(config.read_timeout, Duration::from_secs(5));
    }
}
