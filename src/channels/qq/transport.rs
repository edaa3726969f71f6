//! Boundary between the channel and the platform SDK.

use crate::config::QqConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Bot credentials handed to the transport on every connect.
#[derive(Clone, PartialEq, Eq)]
pub struct QqCredentials {
    pub app_id: String,
    pub secret: String,
}

impl QqCredentials {
    /// Credentials from config, or `None` when either part is blank.
    pub fn from_config(config: &QqConfig) -> Option<Self> {
        if !config.has_credentials() {
            return None;
        }
        Some(Self {
            app_id: config.app_id.trim().to_string(),
            secret: config.secret.trim().to_string(),
        })
    }
}

impl fmt::Debug for QqCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QqCredentials")
            .field("app_id", &self.app_id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Callbacks the transport invokes while connected.
#[async_trait]
pub trait ConnectionEventSink: Send + Sync {
    async fn on_ready(&self, bot_name: &str);
    async fn on_direct_message(&self, raw: Value);
    async fn on_group_message(&self, raw: Value);
}

/// Platform connection and send API.
#[async_trait]
pub trait QqTransport: Send + Sync {
    fn name(&self) -> &str;

    /// Connect and deliver events to `sink`. Resolves when the connection
    /// ends, either cleanly or with an error.
    async fn connect(
        &self,
        credentials: &QqCredentials,
        sink: Arc<dyn ConnectionEventSink>,
    ) -> Result<()>;

    async fn send_direct(&self, openid: &str, content: &str) -> Result<()>;

    async fn send_group(
        &self,
        group_openid: &str,
        content: &str,
        reply_to: Option<&str>,
    ) -> Result<()>;
}
