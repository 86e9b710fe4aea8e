pub mod audit;
pub mod commands;
pub mod db;
pub mod error;
pub mod security;

use std::sync::Arc;
use tauri::Manager;
use tokio::sync::Mutex;

use commands::SessionState;
use db::session::SessionManager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let session: SessionState = Arc::new(Mutex::new(SessionManager::sql_server()));

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .manage(session)
        .setup(|app| {
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::connection::test_connection,
            commands::connection::connect,
            commands::connection::disconnect,
            commands::schema::get_databases,
            commands::schema::get_objects,
            commands::audit::check_existing_audit,
            commands::audit::create_audit,
            commands::audit::remove_audit,
            commands::audit::read_audit,
            commands::audit::get_audit_status,
            commands::dialog::select_folder,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app, event| {
            if let tauri::RunEvent::Exit = event {
                let session = app.state::<SessionState>().inner().clone();
                tauri::async_runtime::block_on(async move {
                    if let Err(e) = session.lock().await.disconnect().await {
                        log::warn!("Failed to close session on exit: {}", e);
                    }
                });
            }
        });
}
