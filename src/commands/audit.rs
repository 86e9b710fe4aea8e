use tauri::State;

use super::{handlers, Data, Envelope, SessionState};
use crate::audit::manager::{AuditStatus, CreatedAudit, ExistingAudit, RemovalReport};
use crate::audit::naming::AuditTarget;
use crate::db::schema::AuditRecord;

// Arguments arrive as `{ database, schemaName, objectName[, auditFilePath] }`.

#[tauri::command]
pub async fn check_existing_audit(
    database: String,
    schema_name: String,
    object_name: String,
    session: State<'_, SessionState>,
) -> Result<Envelope<ExistingAudit>, String> {
    let target = AuditTarget::new(database, schema_name, object_name);
    Ok(handlers::check_existing_audit(&session, &target).await)
}

#[tauri::command]
pub async fn create_audit(
    database: String,
    schema_name: String,
    object_name: String,
    audit_file_path: String,
    session: State<'_, SessionState>,
) -> Result<Envelope<CreatedAudit>, String> {
    let target = AuditTarget::new(database, schema_name, object_name);
    Ok(handlers::create_audit(&session, &target, &audit_file_path).await)
}

#[tauri::command]
pub async fn remove_audit(
    database: String,
    schema_name: String,
    object_name: String,
    session: State<'_, SessionState>,
) -> Result<Envelope<RemovalReport>, String> {
    let target = AuditTarget::new(database, schema_name, object_name);
    Ok(handlers::remove_audit(&session, &target).await)
}

#[tauri::command]
pub async fn read_audit(
    database: String,
    schema_name: String,
    object_name: String,
    audit_file_path: String,
    session: State<'_, SessionState>,
) -> Result<Envelope<Data<Vec<AuditRecord>>>, String> {
    let target = AuditTarget::new(database, schema_name, object_name);
    Ok(handlers::read_audit(&session, &target, &audit_file_path).await)
}

#[tauri::command]
pub async fn get_audit_status(
    database: String,
    schema_name: String,
    object_name: String,
    session: State<'_, SessionState>,
) -> Result<Envelope<AuditStatus>, String> {
    let target = AuditTarget::new(database, schema_name, object_name);
    Ok(handlers::get_audit_status(&session, &target).await)
}
