use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Platform-specific routing hints carried alongside canonical messages.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Metadata key holding the platform's original message id.
pub const META_MESSAGE_ID: &str = "message_id";
/// Metadata key discriminating the outbound target (`direct` or `group`).
pub const META_TARGET_KIND: &str = "target_kind";
/// Metadata key holding the group identifier for group targets.
pub const META_GROUP_ID: &str = "group_id";

pub const TARGET_KIND_DIRECT: &str = "direct";
pub const TARGET_KIND_GROUP: &str = "group";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel: String,
    pub sender_id: String,
    pub chat_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub chat_id: String,
    pub content: String,
    pub reply_to: Option<String>,
    pub metadata: Metadata,
}

impl OutboundMessage {
    /// Build a reply addressed to the same conversation as `inbound`.
    ///
    /// The inbound metadata is carried over so group replies keep their
    /// target kind, group id and the message id they answer.
    pub fn in_reply_to(inbound: &InboundMessage, content: impl Into<String>) -> Self {
        Self {
            channel: inbound.channel.clone(),
            chat_id: inbound.chat_id.clone(),
            content: content.into(),
            reply_to: inbound
                .metadata
                .get(META_MESSAGE_ID)
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string),
            metadata: inbound.metadata.clone(),
        }
    }

    /// Look up a string-valued metadata entry.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(serde_json::Value::as_str)
    }
}
