use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single result row as column name -> JSON value
pub type Row = HashMap<String, serde_json::Value>;

/// Decode a result row into a typed record by column name.
pub fn from_row<T: DeserializeOwned>(row: &Row) -> Result<T, serde_json::Error> {
    let object: serde_json::Map<String, serde_json::Value> =
        row.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    serde_json::from_value(serde_json::Value::Object(object))
}

/// A user object that can be the subject of an audit.
///
/// Rows arrive with the catalog's snake_case column names and leave for the
/// frontend in camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct DatabaseObject {
    pub schema_name: String,
    pub object_name: String,
    pub object_type: String,
    pub full_name: String,
}

/// Server audit as reported by the engine catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct ServerAuditInfo {
    pub name: String,
    /// `STARTED` or `STOPPED`
    pub status_desc: String,
    pub log_file_path: Option<String>,
}

impl ServerAuditInfo {
    pub fn is_started(&self) -> bool {
        self.status_desc == "STARTED"
    }
}

/// Database audit specification as reported by the database catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct AuditSpecInfo {
    pub name: String,
    pub is_state_enabled: bool,
}

/// One captured event read back from the audit files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct AuditRecord {
    pub event_time: NaiveDateTime,
    pub action_id: String,
    /// Readable label for `action_id`, filled in after decoding.
    #[serde(default)]
    pub action_name: String,
    pub succeeded: bool,
    pub server_principal_name: Option<String>,
    pub database_principal_name: Option<String>,
    pub server_instance_name: Option<String>,
    pub database_name: Option<String>,
    pub schema_name: Option<String>,
    pub object_name: Option<String>,
    pub statement: Option<String>,
    pub client_ip: Option<String>,
    pub application_name: Option<String>,
    pub host_name: Option<String>,
    pub session_id: Option<i64>,
    pub transaction_id: Option<i64>,
    pub class_type: Option<String>,
}
