//! Audit lifecycle commands for a single target object.
//!
//! Every operation takes the session explicitly, checks that it is live
//! before doing anything else, and derives the audit and specification names
//! from the target on each call. Create and remove are sequences of
//! independently committed statements, each guarded by an existence check,
//! so repeating either call is harmless.

use serde::Serialize;

use crate::audit::actions::{action_label, record_matches};
use crate::audit::naming::AuditTarget;
use crate::db::connectors::DatabaseConnector;
use crate::db::schema::{from_row, AuditRecord, AuditSpecInfo, ServerAuditInfo};
use crate::db::session::SessionManager;
use crate::error::Result;
use crate::security::{quote_identifier, quote_literal, validate_audit_path};

/// Rollover size of each audit file.
pub const AUDIT_MAX_SIZE_MB: u32 = 100;

/// Number of audit files kept before the oldest is overwritten.
pub const AUDIT_MAX_ROLLOVER_FILES: u32 = 10;

/// Milliseconds the engine may buffer events before writing them.
pub const AUDIT_QUEUE_DELAY_MS: u32 = 1000;

/// Actions captured on the target object, for every principal.
pub const OBJECT_ACTIONS: &[&str] = &["INSERT", "UPDATE", "DELETE", "SELECT", "EXECUTE"];

/// Action group captured database-wide.
pub const CHANGE_ACTION_GROUP: &str = "SCHEMA_OBJECT_CHANGE_GROUP";

const FIND_SERVER_AUDIT_SQL: &str = "\
SELECT a.name, \
       CASE a.is_state_enabled WHEN 1 THEN 'STARTED' ELSE 'STOPPED' END AS status_desc, \
       f.log_file_path \
FROM sys.server_audits a \
LEFT JOIN sys.server_file_audits f ON f.audit_id = a.audit_id \
WHERE a.name = @P1";

const ENABLE_SERVER_AUDIT_GUARD: &str = "\
IF EXISTS (SELECT 1 FROM sys.server_audits WHERE name = @P1 AND is_state_enabled = 0)";

const AUDIT_FILE_COLUMNS: &str = "event_time, action_id, succeeded, \
server_principal_name, database_principal_name, server_instance_name, \
database_name, schema_name, object_name, statement, client_ip, \
application_name, host_name, session_id, transaction_id, class_type";

// ── Result types ────────────────────────────────────────────────────────

/// Engine-side state of one target, read through on every call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditLookup {
    pub audit: Option<ServerAuditInfo>,
    pub spec: Option<AuditSpecInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingAudit {
    pub exists: bool,
    pub audit: Option<ServerAuditInfo>,
    pub spec: Option<AuditSpecInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStatus {
    pub active: bool,
    pub audit: Option<ServerAuditInfo>,
    pub spec: Option<AuditSpecInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAudit {
    pub audit_name: String,
    pub spec_name: String,
}

/// Outcome of a best-effort removal.
///
/// `warnings` holds one message per half (specification, server audit) that
/// failed; the call itself still succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalReport {
    pub audit_name: String,
    pub spec_name: String,
    pub warnings: Vec<String>,
}

impl RemovalReport {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

// ── Statement builders ──────────────────────────────────────────────────

fn find_spec_sql(target: &AuditTarget) -> String {
    format!(
        "SELECT name, is_state_enabled \
         FROM {}.sys.database_audit_specifications \
         WHERE name = @P1",
        target.quoted_database()
    )
}

fn create_server_audit_sql(target: &AuditTarget, audit_file_path: &str) -> String {
    format!(
        "IF NOT EXISTS (SELECT 1 FROM sys.server_audits WHERE name = @P1)\n\
         BEGIN\n\
         \x20   CREATE SERVER AUDIT {audit}\n\
         \x20   TO FILE (\n\
         \x20       FILEPATH = {path},\n\
         \x20       MAXSIZE = {size} MB,\n\
         \x20       MAX_ROLLOVER_FILES = {files},\n\
         \x20       RESERVE_DISK_SPACE = OFF\n\
         \x20   )\n\
         \x20   WITH (\n\
         \x20       QUEUE_DELAY = {delay},\n\
         \x20       ON_FAILURE = CONTINUE\n\
         \x20   );\n\
         END",
        audit = quote_identifier(&target.audit_name()),
        path = quote_literal(audit_file_path),
        size = AUDIT_MAX_SIZE_MB,
        files = AUDIT_MAX_ROLLOVER_FILES,
        delay = AUDIT_QUEUE_DELAY_MS,
    )
}

fn enable_server_audit_sql(target: &AuditTarget) -> String {
    format!(
        "{}\n    ALTER SERVER AUDIT {} WITH (STATE = ON);",
        ENABLE_SERVER_AUDIT_GUARD,
        quote_identifier(&target.audit_name())
    )
}

fn create_spec_sql(target: &AuditTarget) -> String {
    let object = target.quoted_object();
    let mut clauses = vec![format!("ADD ({})", CHANGE_ACTION_GROUP)];
    clauses.extend(
        OBJECT_ACTIONS
            .iter()
            .map(|action| format!("ADD ({} ON OBJECT::{} BY [public])", action, object)),
    );

    format!(
        "USE {db};\n\
         IF NOT EXISTS (SELECT 1 FROM sys.database_audit_specifications WHERE name = @P1)\n\
         BEGIN\n\
         \x20   CREATE DATABASE AUDIT SPECIFICATION {spec}\n\
         \x20   FOR SERVER AUDIT {audit}\n\
         \x20   {clauses}\n\
         \x20   WITH (STATE = ON);\n\
         END",
        db = target.quoted_database(),
        spec = quote_identifier(&target.spec_name()),
        audit = quote_identifier(&target.audit_name()),
        clauses = clauses.join(",\n    "),
    )
}

fn drop_spec_sql(target: &AuditTarget) -> String {
    let spec = quote_identifier(&target.spec_name());
    format!(
        "USE {db};\n\
         IF EXISTS (SELECT 1 FROM sys.database_audit_specifications WHERE name = @P1)\n\
         BEGIN\n\
         \x20   ALTER DATABASE AUDIT SPECIFICATION {spec} WITH (STATE = OFF);\n\
         \x20   DROP DATABASE AUDIT SPECIFICATION {spec};\n\
         END",
        db = target.quoted_database(),
        spec = spec,
    )
}

fn drop_server_audit_sql(target: &AuditTarget) -> String {
    let audit = quote_identifier(&target.audit_name());
    format!(
        "IF EXISTS (SELECT 1 FROM sys.server_audits WHERE name = @P1)\n\
         BEGIN\n\
         \x20   ALTER SERVER AUDIT {audit} WITH (STATE = OFF);\n\
         \x20   DROP SERVER AUDIT {audit};\n\
         END",
        audit = audit,
    )
}

fn read_audit_sql() -> String {
    // Coarse filter only; `record_matches` decides the statement-text case.
    format!(
        "SELECT {columns} \
         FROM sys.fn_get_audit_file(@P1, DEFAULT, DEFAULT) \
         WHERE (object_name = @P2 AND schema_name = @P3) \
            OR class_type IN ('OB', 'SC') \
         ORDER BY event_time DESC",
        columns = AUDIT_FILE_COLUMNS
    )
}

/// `<dir>\*.sqlaudit`, or `<dir>/*.sqlaudit` for POSIX-style directories.
pub fn audit_file_pattern(audit_file_path: &str) -> String {
    let posix = audit_file_path.contains('/') && !audit_file_path.contains('\\');
    let dir = audit_file_path.trim_end_matches(['\\', '/']);
    let sep = if posix { '/' } else { '\\' };
    format!("{}{}*.sqlaudit", dir, sep)
}

// ── Operations ──────────────────────────────────────────────────────────

async fn lookup(conn: &dyn DatabaseConnector, target: &AuditTarget) -> Result<AuditLookup> {
    let audit_name = target.audit_name();
    let rows = conn.query(FIND_SERVER_AUDIT_SQL, &[audit_name.as_str()]).await?;
    let audit = match rows.first() {
        Some(row) => from_row::<ServerAuditInfo>(row)?,
        None => return Ok(AuditLookup::default()),
    };

    let spec_name = target.spec_name();
    let rows = conn.query(&find_spec_sql(target), &[spec_name.as_str()]).await?;
    let spec = rows.first().map(from_row::<AuditSpecInfo>).transpose()?;

    Ok(AuditLookup {
        audit: Some(audit),
        spec,
    })
}

/// Report whether the server audit for `target` exists, with its specification.
pub async fn check_existing_audit(
    session: &SessionManager,
    target: &AuditTarget,
) -> Result<ExistingAudit> {
    let conn = session.connector().await?;
    target.validate()?;

    let found = lookup(conn, target).await?;
    Ok(ExistingAudit {
        exists: found.audit.is_some(),
        audit: found.audit,
        spec: found.spec,
    })
}

/// Re-query the engine for the current state of `target`.
pub async fn get_audit_status(
    session: &SessionManager,
    target: &AuditTarget,
) -> Result<AuditStatus> {
    let conn = session.connector().await?;
    target.validate()?;

    let found = lookup(conn, target).await?;
    Ok(AuditStatus {
        active: found.audit.is_some(),
        audit: found.audit,
        spec: found.spec,
    })
}

/// Create, start and scope the audit for `target`.
///
/// The directory must already exist on the database server's host; the
/// engine's error is returned as-is when it does not.
pub async fn create_audit(
    session: &SessionManager,
    target: &AuditTarget,
    audit_file_path: &str,
) -> Result<CreatedAudit> {
    let conn = session.connector().await?;
    target.validate()?;
    validate_audit_path(audit_file_path)?;

    let audit_name = target.audit_name();
    let spec_name = target.spec_name();

    conn.execute(
        &create_server_audit_sql(target, audit_file_path),
        &[audit_name.as_str()],
    )
    .await?;
    conn.execute(&enable_server_audit_sql(target), &[audit_name.as_str()])
        .await?;
    conn.execute(&create_spec_sql(target), &[spec_name.as_str()])
        .await?;

    log::info!("Audit {} ready for {}", audit_name, target);
    Ok(CreatedAudit {
        audit_name,
        spec_name,
    })
}

/// Stop and drop the specification, then the server audit.
///
/// Each half runs even if the other fails. Failures are logged and listed in
/// the report rather than returned as an error.
pub async fn remove_audit(session: &SessionManager, target: &AuditTarget) -> Result<RemovalReport> {
    let conn = session.connector().await?;
    target.validate()?;

    let audit_name = target.audit_name();
    let spec_name = target.spec_name();
    let mut warnings = Vec::new();

    if let Err(e) = conn.execute(&drop_spec_sql(target), &[spec_name.as_str()]).await {
        log::warn!("Could not remove audit specification {}: {}", spec_name, e);
        warnings.push(format!("Audit specification {}: {}", spec_name, e));
    }

    if let Err(e) = conn
        .execute(&drop_server_audit_sql(target), &[audit_name.as_str()])
        .await
    {
        log::warn!("Could not remove server audit {}: {}", audit_name, e);
        warnings.push(format!("Server audit {}: {}", audit_name, e));
    }

    log::info!("Audit {} removed for {}", audit_name, target);
    Ok(RemovalReport {
        audit_name,
        spec_name,
        warnings,
    })
}

/// Read the captured events for `target`, newest first.
pub async fn read_audit(
    session: &SessionManager,
    target: &AuditTarget,
    audit_file_path: &str,
) -> Result<Vec<AuditRecord>> {
    let conn = session.connector().await?;
    target.validate()?;
    validate_audit_path(audit_file_path)?;

    let pattern = audit_file_pattern(audit_file_path);
    let rows = conn
        .query(
            &read_audit_sql(),
            &[
                pattern.as_str(),
                target.object_name.as_str(),
                target.schema_name.as_str(),
            ],
        )
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut record: AuditRecord = from_row(row)?;
        if !record_matches(&record, target) {
            continue;
        }
        record.action_name = action_label(&record.action_id).to_string();
        records.push(record);
    }
    records.sort_by(|a, b| b.event_time.cmp(&a.event_time));

    log::debug!("Read {} audit records for {}", records.len(), target);
    Ok(records)
}
