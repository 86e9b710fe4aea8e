//! Request handlers behind the Tauri commands.
//!
//! Each handler locks the session, runs one operation and folds the outcome
//! into an [`Envelope`]. Nothing here returns an error to the caller.

use tokio::sync::Mutex;

use super::dialog::{DirectoryPicker, SelectedFolder, FOLDER_DIALOG_TITLE};
use super::{Ack, Data, Envelope};
use crate::audit::manager::{self, AuditStatus, CreatedAudit, ExistingAudit, RemovalReport};
use crate::audit::naming::AuditTarget;
use crate::db::connectors::ConnectionConfig;
use crate::db::metadata;
use crate::db::schema::{AuditRecord, DatabaseObject};
use crate::db::session::SessionManager;
use crate::error::AuditError;

pub async fn test_connection(session: &Mutex<SessionManager>, config: ConnectionConfig) -> Envelope<Ack> {
    let session = session.lock().await;
    Envelope::from_result(session.test_connection(config).await.map(|_| Ack {}))
}

pub async fn connect(session: &Mutex<SessionManager>, config: ConnectionConfig) -> Envelope<Ack> {
    let mut session = session.lock().await;
    Envelope::from_result(session.connect(config).await.map(|_| Ack {}))
}

pub async fn disconnect(session: &Mutex<SessionManager>) -> Envelope<Ack> {
    let mut session = session.lock().await;
    Envelope::from_result(session.disconnect().await.map(|_| Ack {}))
}

pub async fn get_databases(session: &Mutex<SessionManager>) -> Envelope<Data<Vec<String>>> {
    let session = session.lock().await;
    Envelope::from_result(
        metadata::list_databases(&session)
            .await
            .map(|data| Data { data }),
    )
}

pub async fn get_objects(
    session: &Mutex<SessionManager>,
    database: &str,
) -> Envelope<Data<Vec<DatabaseObject>>> {
    let session = session.lock().await;
    Envelope::from_result(
        metadata::list_objects(&session, database)
            .await
            .map(|data| Data { data }),
    )
}

pub async fn check_existing_audit(
    session: &Mutex<SessionManager>,
    target: &AuditTarget,
) -> Envelope<ExistingAudit> {
    let session = session.lock().await;
    Envelope::from_result(manager::check_existing_audit(&session, target).await)
}

pub async fn create_audit(
    session: &Mutex<SessionManager>,
    target: &AuditTarget,
    audit_file_path: &str,
) -> Envelope<CreatedAudit> {
    let session = session.lock().await;
    Envelope::from_result(manager::create_audit(&session, target, audit_file_path).await)
}

pub async fn remove_audit(
    session: &Mutex<SessionManager>,
    target: &AuditTarget,
) -> Envelope<RemovalReport> {
    let session = session.lock().await;
    Envelope::from_result(manager::remove_audit(&session, target).await)
}

pub async fn read_audit(
    session: &Mutex<SessionManager>,
    target: &AuditTarget,
    audit_file_path: &str,
) -> Envelope<Data<Vec<AuditRecord>>> {
    let session = session.lock().await;
    Envelope::from_result(
        manager::read_audit(&session, target, audit_file_path)
            .await
            .map(|data| Data { data }),
    )
}

pub async fn get_audit_status(
    session: &Mutex<SessionManager>,
    target: &AuditTarget,
) -> Envelope<AuditStatus> {
    let session = session.lock().await;
    Envelope::from_result(manager::get_audit_status(&session, target).await)
}

pub async fn select_folder(picker: &dyn DirectoryPicker) -> Envelope<SelectedFolder> {
    let picked = picker
        .pick_directory(FOLDER_DIALOG_TITLE)
        .await
        .ok_or(AuditError::Cancelled)
        .map(|path| SelectedFolder {
            path: path.to_string_lossy().into_owned(),
        });
    Envelope::from_result(picked)
}
