pub mod sqlserver;

use crate::db::schema::Row;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Port used when the profile leaves it out.
pub const DEFAULT_PORT: u16 = 1433;

/// Connect timeout for `testConnection` probes.
pub const PROBE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Connect timeout for the long-lived session.
pub const SESSION_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Per-request timeout for the long-lived session.
pub const SESSION_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection profile for a SQL Server instance.
///
/// Supplied fresh by the frontend on every connect; never persisted.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub server: String,
    pub port: u16,
    pub database: Option<String>,
    pub username: String,
    pub password: String,
    pub encrypt: bool,
    pub trust_certificate: bool,
    pub connection_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: DEFAULT_PORT,
            database: None,
            username: String::new(),
            password: String::new(),
            encrypt: false,
            trust_certificate: true,
            connection_timeout_secs: SESSION_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: Some(SESSION_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ConnectionConfig {
    /// Timeouts for a short-lived connectivity check.
    pub fn for_probe(mut self) -> Self {
        self.connection_timeout_secs = PROBE_CONNECT_TIMEOUT_SECS;
        self.request_timeout_secs = None;
        self
    }

    /// Timeouts for the session that serves every later command.
    pub fn for_session(mut self) -> Self {
        self.connection_timeout_secs = SESSION_CONNECT_TIMEOUT_SECS;
        self.request_timeout_secs = Some(SESSION_REQUEST_TIMEOUT_SECS);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// `server:port/database`, safe to log.
    pub fn describe(&self) -> String {
        match self.database.as_deref().filter(|d| !d.is_empty()) {
            Some(db) => format!("{}:{}/{}", self.server, self.port, db),
            None => format!("{}:{}", self.server, self.port),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("encrypt", &self.encrypt)
            .field("trust_certificate", &self.trust_certificate)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// A live handle to the database engine.
///
/// String parameters are bound positionally as `@P1`, `@P2`, ... .
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    /// Connect to the database
    async fn connect(&mut self) -> Result<()>;

    /// Close the connection
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if the connection is active
    async fn is_connected(&self) -> bool;

    /// Run a statement and return the rows of its first result set
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>>;

    /// Run a statement batch for its side effects
    async fn execute(&self, sql: &str, params: &[&str]) -> Result<()>;
}
