use super::{ConnectionConfig, DatabaseConnector};
use crate::db::schema::Row;
use crate::error::{AuditError, Result};
use anyhow::Context;
use async_trait::async_trait;
use std::future::Future;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, ToSql};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// Reported to the engine so audit records show where a change came from.
const APPLICATION_NAME: &str = "Who Changed That";

type SqlClient = Client<Compat<TcpStream>>;

/// SQL Server connector using tiberius
pub struct SqlServerConnector {
    config: ConnectionConfig,
    client: Mutex<Option<SqlClient>>,
}

impl SqlServerConnector {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    /// Build a tiberius Config from our ConnectionConfig
    fn build_tiberius_config(&self) -> Config {
        let mut tib_config = Config::new();

        tib_config.host(&self.config.server);
        tib_config.port(self.config.port);
        tib_config.application_name(APPLICATION_NAME);

        if let Some(db) = self.config.database.as_deref().filter(|d| !d.is_empty()) {
            tib_config.database(db);
        }

        tib_config.authentication(AuthMethod::sql_server(
            &self.config.username,
            &self.config.password,
        ));

        if self.config.trust_certificate {
            tib_config.trust_cert();
        }
        // `Off` still protects the login packet, matching the usual driver default.
        tib_config.encryption(if self.config.encrypt {
            EncryptionLevel::Required
        } else {
            EncryptionLevel::Off
        });

        tib_config
    }

    async fn open(tib_config: Config, addr: String) -> anyhow::Result<SqlClient> {
        let tcp = TcpStream::connect(&addr)
            .await
            .context(format!("Failed to connect to SQL Server at {}", addr))?;
        tcp.set_nodelay(true)?;

        let client = Client::connect(tib_config, tcp.compat_write())
            .await
            .context("TDS connection/authentication failed")?;
        Ok(client)
    }

    /// Run `fut` under the per-request timeout, if one is configured.
    ///
    /// A timed-out request leaves the TDS stream mid-response, so the caller
    /// must drop the client when this returns `Ok(None)`.
    async fn with_request_timeout<T, F>(&self, fut: F) -> Option<Result<T>>
    where
        F: Future<Output = Result<T>>,
    {
        match self.config.request_timeout() {
            Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
            None => Some(fut.await),
        }
    }

    fn timeout_error(&self) -> AuditError {
        let millis = self
            .config
            .request_timeout()
            .map(|d| d.as_millis())
            .unwrap_or_default();
        AuditError::Query(format!(
            "Timeout: Request failed to complete in {}ms",
            millis
        ))
    }

    /// Convert a tiberius Row into our Row type (HashMap<String, Value>)
    fn row_to_map(row: &tiberius::Row) -> Row {
        let mut map = std::collections::HashMap::new();
        for col in row.columns() {
            let name = col.name().to_string();
            let value = Self::column_to_json(row, col);
            map.insert(name, value);
        }
        map
    }

    /// Convert a single tiberius column value to serde_json::Value
    fn column_to_json(row: &tiberius::Row, col: &tiberius::Column) -> serde_json::Value {
        use tiberius::ColumnType;

        match col.column_type() {
            ColumnType::Null => serde_json::Value::Null,
            ColumnType::Bit | ColumnType::Bitn => match row.try_get::<bool, _>(col.name()) {
                Ok(Some(v)) => serde_json::Value::Bool(v),
                _ => serde_json::Value::Null,
            },
            ColumnType::Int1 => match row.try_get::<u8, _>(col.name()) {
                Ok(Some(v)) => serde_json::json!(v),
                _ => serde_json::Value::Null,
            },
            ColumnType::Int2 => match row.try_get::<i16, _>(col.name()) {
                Ok(Some(v)) => serde_json::json!(v),
                _ => serde_json::Value::Null,
            },
            ColumnType::Int4 => match row.try_get::<i32, _>(col.name()) {
                Ok(Some(v)) => serde_json::json!(v),
                _ => serde_json::Value::Null,
            },
            ColumnType::Int8 => match row.try_get::<i64, _>(col.name()) {
                Ok(Some(v)) => serde_json::json!(v),
                _ => serde_json::Value::Null,
            },
            ColumnType::Intn => {
                if let Ok(Some(v)) = row.try_get::<i64, _>(col.name()) {
                    serde_json::json!(v)
                } else if let Ok(Some(v)) = row.try_get::<i32, _>(col.name()) {
                    serde_json::json!(v)
                } else if let Ok(Some(v)) = row.try_get::<i16, _>(col.name()) {
                    serde_json::json!(v)
                } else if let Ok(Some(v)) = row.try_get::<u8, _>(col.name()) {
                    serde_json::json!(v)
                } else {
                    serde_json::Value::Null
                }
            }
            ColumnType::Datetime
            | ColumnType::Datetime2
            | ColumnType::Datetime4
            | ColumnType::Datetimen => {
                match row.try_get::<chrono::NaiveDateTime, _>(col.name()) {
                    Ok(Some(v)) => serde_json::json!(v),
                    _ => serde_json::Value::Null,
                }
            }
            ColumnType::DatetimeOffsetn => {
                match row.try_get::<chrono::DateTime<chrono::FixedOffset>, _>(col.name()) {
                    Ok(Some(v)) => serde_json::json!(v.naive_utc()),
                    _ => serde_json::Value::Null,
                }
            }
            _ => {
                // Audit and catalog text columns are all (n)varchar / sysname
                match row.try_get::<&str, _>(col.name()) {
                    Ok(Some(v)) => serde_json::Value::String(v.to_string()),
                    _ => serde_json::Value::Null,
                }
            }
        }
    }
}

/// Prefer the engine's own message text over tiberius' wrapper.
fn engine_message(err: tiberius::error::Error) -> String {
    match err {
        tiberius::error::Error::Server(token) => token.message().to_string(),
        other => other.to_string(),
    }
}

fn query_error(err: tiberius::error::Error) -> AuditError {
    AuditError::Query(engine_message(err))
}

#[async_trait]
impl DatabaseConnector for SqlServerConnector {
    async fn connect(&mut self) -> Result<()> {
        let tib_config = self.build_tiberius_config();
        let addr = format!("{}:{}", self.config.server, self.config.port);
        let limit = self.config.connect_timeout();

        let client = tokio::time::timeout(limit, Self::open(tib_config, addr.clone()))
            .await
            .map_err(|_| {
                AuditError::Connection(format!(
                    "Failed to connect to {} in {}ms",
                    addr,
                    limit.as_millis()
                ))
            })?
            .map_err(|e| AuditError::Connection(format!("{:#}", e)))?;

        *self.client.lock().await = Some(client);
        log::debug!("Opened SQL Server connection to {}", self.config.describe());
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(client) = self.client.lock().await.take() {
            client
                .close()
                .await
                .map_err(|e| AuditError::Connection(engine_message(e)))?;
            log::debug!("Closed SQL Server connection to {}", self.config.describe());
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.client.lock().await.is_some()
    }

    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or(AuditError::NotConnected)?;
        log::debug!("query: {}", sql.trim());

        let bound: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        let outcome = self
            .with_request_timeout(async {
                let refs: Vec<&dyn ToSql> = bound.iter().map(|p| p as &dyn ToSql).collect();
                let stream = if refs.is_empty() {
                    client.simple_query(sql).await
                } else {
                    client.query(sql, &refs).await
                }
                .map_err(query_error)?;
                stream.into_first_result().await.map_err(query_error)
            })
            .await;

        match outcome {
            Some(rows) => Ok(rows?.iter().map(Self::row_to_map).collect()),
            None => {
                log::warn!("Query timed out; dropping connection to {}", self.config.describe());
                *guard = None;
                Err(self.timeout_error())
            }
        }
    }

    async fn execute(&self, sql: &str, params: &[&str]) -> Result<()> {
        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or(AuditError::NotConnected)?;
        log::debug!("execute: {}", sql.trim());

        let bound: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        let outcome = self
            .with_request_timeout(async {
                let refs: Vec<&dyn ToSql> = bound.iter().map(|p| p as &dyn ToSql).collect();
                if refs.is_empty() {
                    client
                        .simple_query(sql)
                        .await
                        .map_err(query_error)?
                        .into_results()
                        .await
                        .map_err(query_error)?;
                } else {
                    client.execute(sql, &refs).await.map_err(query_error)?;
                }
                Ok(())
            })
            .await;

        match outcome {
            Some(result) => result,
            None => {
                log::warn!("Statement timed out; dropping connection to {}", self.config.describe());
                *guard = None;
                Err(self.timeout_error())
            }
        }
    }
}
