//! Integration tests against a live SQL Server instance.
//!
//! Prerequisites:
//!   - SQL Server on localhost:1433 with sa/YourPassword123 (sysadmin, or
//!     ALTER ANY SERVER AUDIT + ALTER ANY DATABASE AUDIT)
//!   - database AuditTestDb containing table dbo.Orders
//!   - directory C:\SQLAudit (or /var/opt/mssql/audit on Linux) writable by the service
//!
//! Run with `cargo test --test live_sqlserver_test -- --ignored`.

use whochanged_lib::audit::manager::{
    check_existing_audit, create_audit, get_audit_status, read_audit, remove_audit,
};
use whochanged_lib::audit::AuditTarget;
use whochanged_lib::db::connectors::ConnectionConfig;
use whochanged_lib::db::metadata::{list_databases, list_objects};
use whochanged_lib::db::session::SessionManager;

// ─── helpers ───────────────────────────────────────────────────────────────

fn sqlserver_config() -> ConnectionConfig {
    ConnectionConfig {
        server: "localhost".to_string(),
        port: 1433,
        database: Some("AuditTestDb".to_string()),
        username: "sa".to_string(),
        password: "YourPassword123".to_string(),
        ..Default::default()
    }
}

fn audit_dir() -> &'static str {
    if cfg!(windows) {
        "C:\\SQLAudit"
    } else {
        "/var/opt/mssql/audit"
    }
}

fn target() -> AuditTarget {
    AuditTarget::new("AuditTestDb", "dbo", "Orders")
}

async fn connected() -> SessionManager {
    let mut session = SessionManager::sql_server();
    session
        .connect(sqlserver_config())
        .await
        .expect("SQL Server connect failed");
    session
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
#[ignore]
async fn sqlserver_test_connection() {
    let session = SessionManager::sql_server();
    session
        .test_connection(sqlserver_config())
        .await
        .expect("connection test failed");
    assert!(!session.is_active().await);
}

#[tokio::test]
#[ignore]
async fn sqlserver_wrong_password() {
    let mut cfg = sqlserver_config();
    cfg.password = "WrongPassword999".to_string();
    let mut session = SessionManager::sql_server();

    assert!(session.connect(cfg).await.is_err());
    assert!(!session.is_active().await);
}

// ═══════════════════════════════════════════════════════════════════════════
//  METADATA
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
#[ignore]
async fn sqlserver_lists_databases_and_objects() {
    let session = connected().await;

    let dbs = list_databases(&session).await.unwrap();
    assert!(dbs.contains(&"AuditTestDb".to_string()));
    assert!(!dbs.contains(&"master".to_string()));

    let objects = list_objects(&session, "AuditTestDb").await.unwrap();
    assert!(objects.iter().any(|o| o.full_name == "dbo.Orders"));
}

// ═══════════════════════════════════════════════════════════════════════════
//  AUDIT LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
#[ignore]
async fn sqlserver_audit_round_trip() {
    let session = connected().await;
    let target = target();

    remove_audit(&session, &target).await.unwrap();

    create_audit(&session, &target, audit_dir()).await.unwrap();
    create_audit(&session, &target, audit_dir()).await.unwrap();

    let existing = check_existing_audit(&session, &target).await.unwrap();
    assert!(existing.exists);
    assert!(existing.audit.unwrap().is_started());
    assert!(existing.spec.unwrap().is_state_enabled);

    // Produce an event, then give the queue delay time to flush.
    session
        .connector()
        .await
        .unwrap()
        .query("SELECT TOP 1 * FROM [AuditTestDb].[dbo].[Orders]", &[])
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    let records = read_audit(&session, &target, audit_dir()).await.unwrap();
    assert!(records.iter().any(|r| r.action_name == "SELECT"));

    let report = remove_audit(&session, &target).await.unwrap();
    assert!(report.is_complete());

    let status = get_audit_status(&session, &target).await.unwrap();
    assert!(!status.active);
}
