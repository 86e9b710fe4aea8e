use crate::db::schema::{from_row, DatabaseObject};
use crate::db::session::SessionManager;
use crate::error::Result;
use crate::security::{quote_identifier, validate_identifier};

/// System databases never offered for auditing.
pub const SYSTEM_DATABASES: &[&str] = &["master", "tempdb", "model", "msdb"];

const LIST_DATABASES_SQL: &str = "\
SELECT name FROM sys.databases \
WHERE state_desc = 'ONLINE' \
  AND name NOT IN ('master', 'tempdb', 'model', 'msdb')";

/// Catalog type codes for tables, views, procedures, functions and triggers.
pub const AUDITABLE_OBJECT_TYPES: &[&str] = &["U", "V", "P", "FN", "IF", "TF", "TR"];

fn list_objects_sql(quoted_db: &str) -> String {
    format!(
        "SELECT s.name AS schema_name, \
                o.name AS object_name, \
                o.type_desc AS object_type, \
                s.name + '.' + o.name AS full_name \
         FROM {db}.sys.objects o \
         JOIN {db}.sys.schemas s ON o.schema_id = s.schema_id \
         WHERE o.type IN ('U', 'V', 'P', 'FN', 'IF', 'TF', 'TR') \
           AND o.is_ms_shipped = 0",
        db = quoted_db
    )
}

/// Online user databases, in case-sensitive ascending order.
pub async fn list_databases(session: &SessionManager) -> Result<Vec<String>> {
    let conn = session.connector().await?;
    let rows = conn.query(LIST_DATABASES_SQL, &[]).await?;

    let mut names: Vec<String> = rows
        .iter()
        .filter_map(|r| r.get("name").and_then(|v| v.as_str()).map(str::to_string))
        .filter(|name| !SYSTEM_DATABASES.contains(&name.as_str()))
        .collect();
    names.sort();
    Ok(names)
}

/// User-created auditable objects of `database`, ordered by type, then schema
/// and name ignoring case.
pub async fn list_objects(session: &SessionManager, database: &str) -> Result<Vec<DatabaseObject>> {
    let conn = session.connector().await?;
    validate_identifier(database)?;

    let rows = conn
        .query(&list_objects_sql(&quote_identifier(database)), &[])
        .await?;

    let mut objects = rows
        .iter()
        .map(from_row::<DatabaseObject>)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    objects.sort_by_cached_key(|o| {
        (
            o.object_type.clone(),
            o.schema_name.to_lowercase(),
            o.object_name.to_lowercase(),
            o.full_name.clone(),
        )
    });
    Ok(objects)
}
