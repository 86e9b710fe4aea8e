use crate::audit::naming::AuditTarget;
use crate::db::schema::AuditRecord;

/// Audit record classes that describe schema-level changes.
pub const SCHEMA_LEVEL_CLASSES: &[&str] = &["OB", "SC"];

/// Readable label for a raw two-letter action code. Unknown codes pass through.
pub fn action_label(code: &str) -> &str {
    match code.trim() {
        "IN" => "INSERT",
        "UP" => "UPDATE",
        "DL" => "DELETE",
        "SL" => "SELECT",
        "EX" => "EXECUTE",
        "AL" => "ALTER",
        "CR" => "CREATE",
        "DR" => "DROP",
        _ => code,
    }
}

/// Whether an audit record belongs to `target`.
///
/// Records carrying the object's own schema and name match directly.
/// Schema-level records often lack structured object identity, so they match
/// when their statement text mentions the object name anywhere. Both checks
/// ignore case, as the engine's default collation does.
pub fn record_matches(record: &AuditRecord, target: &AuditTarget) -> bool {
    let direct = same_name(record.object_name.as_deref(), &target.object_name)
        && same_name(record.schema_name.as_deref(), &target.schema_name);
    if direct {
        return true;
    }

    let schema_level = record
        .class_type
        .as_deref()
        .map(|class| SCHEMA_LEVEL_CLASSES.contains(&class.trim()))
        .unwrap_or(false);

    schema_level
        && record
            .statement
            .as_deref()
            .map(|stmt| {
                stmt.to_lowercase()
                    .contains(&target.object_name.to_lowercase())
            })
            .unwrap_or(false)
}

fn same_name(found: Option<&str>, wanted: &str) -> bool {
    found.is_some_and(|name| name.to_lowercase() == wanted.to_lowercase())
}
