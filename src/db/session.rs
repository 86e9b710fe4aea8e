use std::sync::Arc;

use super::connectors::{sqlserver::SqlServerConnector, ConnectionConfig, DatabaseConnector};
use crate::error::{AuditError, Result};

/// Builds connectors for a connection profile.
pub trait ConnectorFactory: Send + Sync {
    fn create(&self, config: ConnectionConfig) -> Box<dyn DatabaseConnector>;
}

/// Factory for the tiberius-backed SQL Server connector.
pub struct SqlServerFactory;

impl ConnectorFactory for SqlServerFactory {
    fn create(&self, config: ConnectionConfig) -> Box<dyn DatabaseConnector> {
        Box::new(SqlServerConnector::new(config))
    }
}

/// Owns the single live database connection.
///
/// A new `connect` closes the previous handle before opening the next one, so
/// at most one handle is ever held. Callers share the manager behind a lock.
pub struct SessionManager {
    factory: Arc<dyn ConnectorFactory>,
    active: Option<Box<dyn DatabaseConnector>>,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn ConnectorFactory>) -> Self {
        Self {
            factory,
            active: None,
        }
    }

    pub fn sql_server() -> Self {
        Self::new(Arc::new(SqlServerFactory))
    }

    /// Open and immediately close a short-lived connection.
    pub async fn test_connection(&self, config: ConnectionConfig) -> Result<()> {
        let target = config.describe();
        let mut connector = self.factory.create(config.for_probe());
        connector.connect().await?;
        connector.disconnect().await?;
        log::info!("Connection test to {} succeeded", target);
        Ok(())
    }

    /// Replace the active session with a new connection.
    ///
    /// The previous handle is closed first; failures while closing it are
    /// logged and ignored. If the new connection fails no session remains.
    pub async fn connect(&mut self, config: ConnectionConfig) -> Result<()> {
        if let Some(mut previous) = self.active.take() {
            if let Err(e) = previous.disconnect().await {
                log::warn!("Ignoring error while closing previous session: {}", e);
            }
        }

        let target = config.describe();
        let mut connector = self.factory.create(config.for_session());
        connector.connect().await?;
        self.active = Some(connector);
        log::info!("Connected to {}", target);
        Ok(())
    }

    /// Close the active session, if any.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut connector) = self.active.take() {
            connector.disconnect().await?;
            log::info!("Disconnected");
        }
        Ok(())
    }

    /// Whether a session is held and its connection is still open.
    pub async fn is_active(&self) -> bool {
        match self.active.as_deref() {
            Some(connector) => connector.is_connected().await,
            None => false,
        }
    }

    /// The live connection, or `NotConnected`.
    ///
    /// A connector that lost its link (a timed-out request drops the client)
    /// counts as no session.
    pub async fn connector(&self) -> Result<&dyn DatabaseConnector> {
        let connector = self.active.as_deref().ok_or(AuditError::NotConnected)?;
        if !connector.is_connected().await {
            return Err(AuditError::NotConnected);
        }
        Ok(connector)
    }
}
