//! Wire formats of the PBX OpenAPI.

use pbxpresence_domain::{PresenceStatus, RemoteExtension};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub access_token_expire_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExtensionSearchResponse {
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: Option<String>,
    #[serde(default)]
    pub data: Vec<WireExtension>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireExtension {
    pub id: i64,
    #[serde(deserialize_with = "string_or_number")]
    pub number: String,
    #[serde(default)]
    pub caller_id_name: Option<String>,
    #[serde(default)]
    pub email_addr: Option<String>,
    #[serde(default)]
    pub presence_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdatePresenceRequest<'a> {
    pub id: i64,
    pub presence_status: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAck {
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: Option<String>,
}

/// Text for a non-zero `errcode`.
pub(crate) fn error_message(errmsg: Option<String>) -> String {
    errmsg.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| "unknown error".to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl From<WireExtension> for RemoteExtension {
    fn from(wire: WireExtension) -> Self {
        Self {
            remote_id: wire.id,
            number: wire.number,
            name: non_empty(wire.caller_id_name),
            email: non_empty(wire.email_addr),
            presence_status: non_empty(wire.presence_status).map(PresenceStatus::from),
        }
    }
}

/// Extension numbers arrive as strings on most firmware, as integers on some.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
