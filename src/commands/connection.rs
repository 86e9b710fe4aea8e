use serde::{Deserialize, Deserializer};
use tauri::State;

use super::{handlers, Ack, Envelope, SessionState};
use crate::db::connectors::{ConnectionConfig, DEFAULT_PORT};

/// DTO that the frontend sends (camelCase fields).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfigDto {
    pub server: String,
    #[serde(default, deserialize_with = "lenient_port")]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub encrypt: bool,
    #[serde(default = "default_trust_cert")]
    pub trust_cert: bool,
}

fn default_trust_cert() -> bool {
    true
}

/// Form fields arrive as either numbers or strings; anything unusable means
/// "use the default port".
fn lenient_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortField {
        Number(i64),
        Text(String),
    }

    let port = match Option::<PortField>::deserialize(deserializer)? {
        Some(PortField::Number(n)) => u16::try_from(n).ok(),
        Some(PortField::Text(s)) => s.trim().parse::<u16>().ok(),
        None => None,
    };
    Ok(port.filter(|p| *p != 0))
}

impl From<ConnectionConfigDto> for ConnectionConfig {
    fn from(dto: ConnectionConfigDto) -> Self {
        ConnectionConfig {
            server: dto.server,
            port: dto.port.unwrap_or(DEFAULT_PORT),
            database: dto.database.filter(|d| !d.is_empty()),
            username: dto.username,
            password: dto.password,
            encrypt: dto.encrypt,
            trust_certificate: dto.trust_cert,
            ..Default::default()
        }
    }
}

/// Test a database connection without keeping it.
#[tauri::command]
pub async fn test_connection(
    config: ConnectionConfigDto,
    session: State<'_, SessionState>,
) -> Result<Envelope<Ack>, String> {
    Ok(handlers::test_connection(&session, config.into()).await)
}

/// Open the session, closing any previous one.
#[tauri::command]
pub async fn connect(
    config: ConnectionConfigDto,
    session: State<'_, SessionState>,
) -> Result<Envelope<Ack>, String> {
    Ok(handlers::connect(&session, config.into()).await)
}

/// Close the session if one is open.
#[tauri::command]
pub async fn disconnect(session: State<'_, SessionState>) -> Result<Envelope<Ack>, String> {
    Ok(handlers::disconnect(&session).await)
}
