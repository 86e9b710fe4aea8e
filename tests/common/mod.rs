//! In-memory stand-in for a SQL Server instance.
//!
//! `FakeEngine` recognises the statements the backend issues by their
//! leading DDL/DML keywords and keeps just enough state (server audits,
//! specifications, catalog rows, audit-file rows) to exercise the audit
//! lifecycle without a server. Every statement is journaled.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use whochanged_lib::db::connectors::{ConnectionConfig, DatabaseConnector};
use whochanged_lib::db::schema::Row;
use whochanged_lib::db::session::{ConnectorFactory, SessionManager};
use whochanged_lib::error::{AuditError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

#[derive(Default)]
pub struct EngineState {
    /// server audit name -> started
    pub audits: BTreeMap<String, bool>,
    /// server audit name -> FILEPATH literal it was created with
    pub audit_paths: BTreeMap<String, String>,
    /// specification name -> enabled
    pub specs: BTreeMap<String, bool>,
    pub databases: Vec<String>,
    pub objects: Vec<Row>,
    pub audit_rows: Vec<Row>,
    pub journal: Vec<Statement>,
    pub opened: usize,
    pub closed: usize,
    /// Statements containing any of these fragments fail with a query error.
    pub fail_on: BTreeSet<String>,
    pub refuse_login: bool,
    /// The open connection has been dropped, as after a request timeout.
    pub link_lost: bool,
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut EngineState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn journal(&self) -> Vec<Statement> {
        self.with(|s| s.journal.clone())
    }

    pub fn fail_on(&self, fragment: &str) {
        self.with(|s| s.fail_on.insert(fragment.to_string()));
    }

    pub fn session(&self) -> SessionManager {
        SessionManager::new(Arc::new(FakeFactory {
            engine: self.clone(),
        }))
    }

    pub async fn connected_session(&self) -> SessionManager {
        let mut session = self.session();
        session
            .connect(profile())
            .await
            .expect("fake connect should succeed");
        session
    }

    fn run(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        let mut state = self.state.lock().unwrap();
        state.journal.push(Statement {
            sql: sql.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        });

        if let Some(fragment) = state.fail_on.iter().find(|f| sql.contains(f.as_str())) {
            return Err(AuditError::Query(format!(
                "Simulated failure on '{}'",
                fragment
            )));
        }

        let first = params.first().map(|p| p.to_string()).unwrap_or_default();

        if sql.contains("DROP DATABASE AUDIT SPECIFICATION") {
            state.specs.remove(&first);
            return Ok(Vec::new());
        }
        if sql.contains("CREATE DATABASE AUDIT SPECIFICATION") {
            let audit = first.trim_end_matches("_Spec").to_string();
            if !state.audits.contains_key(&audit) {
                return Err(AuditError::Query(format!(
                    "Cannot find the object \"{}\", because it does not exist.",
                    audit
                )));
            }
            state.specs.entry(first).or_insert(true);
            return Ok(Vec::new());
        }
        if sql.contains("DROP SERVER AUDIT") {
            state.audits.remove(&first);
            state.audit_paths.remove(&first);
            return Ok(Vec::new());
        }
        if sql.contains("CREATE SERVER AUDIT") {
            if !state.audits.contains_key(&first) {
                state.audits.insert(first.clone(), false);
                if let Some(path) = extract_filepath(sql) {
                    state.audit_paths.insert(first, path);
                }
            }
            return Ok(Vec::new());
        }
        if sql.contains("ALTER SERVER AUDIT") && sql.contains("STATE = ON") {
            if let Some(started) = state.audits.get_mut(&first) {
                *started = true;
            }
            return Ok(Vec::new());
        }
        if sql.contains("FROM sys.server_audits a") {
            return Ok(state
                .audits
                .get(&first)
                .map(|started| {
                    vec![row(&[
                        ("name", json!(first)),
                        ("status_desc", json!(if *started { "STARTED" } else { "STOPPED" })),
                        (
                            "log_file_path",
                            state
                                .audit_paths
                                .get(&first)
                                .map(|p| json!(format!("{}\\", p)))
                                .unwrap_or(Value::Null),
                        ),
                    ])]
                })
                .unwrap_or_default());
        }
        if sql.contains("sys.database_audit_specifications") {
            return Ok(state
                .specs
                .get(&first)
                .map(|enabled| {
                    vec![row(&[
                        ("name", json!(first)),
                        ("is_state_enabled", json!(enabled)),
                    ])]
                })
                .unwrap_or_default());
        }
        if sql.contains("FROM sys.databases") {
            return Ok(state
                .databases
                .iter()
                .map(|name| row(&[("name", json!(name))]))
                .collect());
        }
        if sql.contains("sys.objects") {
            return Ok(state.objects.clone());
        }
        if sql.contains("fn_get_audit_file") {
            return Ok(state.audit_rows.clone());
        }

        Err(AuditError::Query(format!("Unrecognised statement: {}", sql)))
    }
}

fn extract_filepath(sql: &str) -> Option<String> {
    let start = sql.find("FILEPATH = N'")? + "FILEPATH = N'".len();
    let rest = &sql[start..];
    let end = rest.find("',")?;
    Some(rest[..end].replace("''", "'"))
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn object_row(schema: &str, name: &str, kind: &str) -> Row {
    row(&[
        ("schema_name", json!(schema)),
        ("object_name", json!(name)),
        ("object_type", json!(kind)),
        ("full_name", json!(format!("{}.{}", schema, name))),
    ])
}

/// An audit-file row with the columns `fn_get_audit_file` returns.
pub fn audit_row(
    time: &str,
    action: &str,
    class: &str,
    schema: Option<&str>,
    object: Option<&str>,
    statement: &str,
) -> Row {
    row(&[
        ("event_time", json!(time)),
        ("action_id", json!(action)),
        ("succeeded", json!(true)),
        ("server_principal_name", json!("CORP\\alice")),
        ("database_principal_name", json!("dbo")),
        ("server_instance_name", json!("SQL01")),
        ("database_name", json!("Sales")),
        ("schema_name", json!(schema.unwrap_or(""))),
        ("object_name", json!(object.unwrap_or(""))),
        ("statement", json!(statement)),
        ("client_ip", json!("10.1.2.3")),
        ("application_name", json!("Microsoft SQL Server Management Studio")),
        ("host_name", json!("WS-042")),
        ("session_id", json!(61)),
        ("transaction_id", json!(987654)),
        ("class_type", json!(class)),
    ])
}

pub fn profile() -> ConnectionConfig {
    ConnectionConfig {
        server: "sql01".to_string(),
        database: Some("Sales".to_string()),
        username: "auditor".to_string(),
        password: "pw".to_string(),
        ..Default::default()
    }
}

pub struct FakeFactory {
    engine: FakeEngine,
}

impl ConnectorFactory for FakeFactory {
    fn create(&self, _config: ConnectionConfig) -> Box<dyn DatabaseConnector> {
        Box::new(FakeConnector {
            engine: self.engine.clone(),
            open: false,
        })
    }
}

pub struct FakeConnector {
    engine: FakeEngine,
    open: bool,
}

#[async_trait]
impl DatabaseConnector for FakeConnector {
    async fn connect(&mut self) -> Result<()> {
        if self.engine.with(|s| s.refuse_login) {
            return Err(AuditError::Connection(
                "Login failed for user 'auditor'.".to_string(),
            ));
        }
        self.engine.with(|s| s.opened += 1);
        self.open = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.open {
            self.engine.with(|s| s.closed += 1);
            self.open = false;
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.open && !self.engine.with(|s| s.link_lost)
    }

    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        if !self.open {
            return Err(AuditError::NotConnected);
        }
        self.engine.run(sql, params)
    }

    async fn execute(&self, sql: &str, params: &[&str]) -> Result<()> {
        if !self.open {
            return Err(AuditError::NotConnected);
        }
        self.engine.run(sql, params).map(|_| ())
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
