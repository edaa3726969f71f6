use serde::{Deserialize, Deserializer, Serialize};

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_dedup_capacity() -> usize {
    1000
}

fn default_transport() -> String {
    "console".to_string()
}

/// Accept either a JSON string or a JSON number for identifier-like fields.
///
/// QQ app ids are numeric, and environment overrides coerce digit-only values
/// to integers before they reach the schema.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

#[derive(Clone, Serialize, Deserialize)]
pub struct QqConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, rename = "appId", deserialize_with = "string_or_number")]
    pub app_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub secret: String,
    #[serde(default, rename = "allowFrom")]
    pub allow_from: Vec<String>,
    /// Fixed delay between a dropped connection and the next attempt.
    #[serde(
        default = "default_reconnect_delay_secs",
        rename = "reconnectDelaySecs"
    )]
    pub reconnect_delay_secs: u64,
    /// Number of recent event ids remembered for replay rejection.
    #[serde(default = "default_dedup_capacity", rename = "dedupCapacity")]
    pub dedup_capacity: usize,
    /// Name of the transport implementation backing the channel.
    #[serde(default = "default_transport")]
    pub transport: String,
}

impl QqConfig {
    pub fn has_credentials(&self) -> bool {
        !self.app_id.trim().is_empty() && !self.secret.trim().is_empty()
    }
}

impl Default for QqConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            app_id: String::new(),
            secret: String::new(),
            allow_from: Vec::new(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            dedup_capacity: default_dedup_capacity(),
            transport: default_transport(),
        }
    }
}

redact_debug!(
    QqConfig,
    enabled,
    app_id,
    redact(secret),
    allow_from,
    reconnect_delay_secs,
    dedup_capacity,
    transport,
);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub qq: QqConfig,
}
