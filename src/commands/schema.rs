use tauri::State;

use super::{handlers, Data, Envelope, SessionState};
use crate::db::schema::DatabaseObject;

/// Return the online user databases on the connected server.
#[tauri::command]
pub async fn get_databases(
    session: State<'_, SessionState>,
) -> Result<Envelope<Data<Vec<String>>>, String> {
    Ok(handlers::get_databases(&session).await)
}

/// Return the auditable objects of one database.
#[tauri::command]
pub async fn get_objects(
    database: String,
    session: State<'_, SessionState>,
) -> Result<Envelope<Data<Vec<DatabaseObject>>>, String> {
    Ok(handlers::get_objects(&session, &database).await)
}
