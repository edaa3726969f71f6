//! Translate raw QQ gateway events into canonical inbound messages.
//!
//! Every event is first checked against the dedup window by its `id`. Any
//! field that cannot be read is logged and the event is dropped; nothing here
//! returns an error to the connection loop.

use super::CHANNEL_NAME;
use super::dedup::DedupWindow;
use crate::bus::events::{
    META_GROUP_ID, META_MESSAGE_ID, META_TARGET_KIND, Metadata, TARGET_KIND_GROUP,
};
use crate::bus::InboundMessage;
use anyhow::{Result, bail};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error};

/// Sender id used when a direct event carries no usable author id.
pub const UNKNOWN_SENDER: &str = "unknown";

/// Normalize a direct (one-to-one) message event.
pub fn normalize_direct(raw: &Value, dedup: &mut DedupWindow) -> Option<InboundMessage> {
    normalize_with(raw, dedup, "direct", extract_direct)
}

/// Normalize a group message that mentions the bot.
pub fn normalize_group(raw: &Value, dedup: &mut DedupWindow) -> Option<InboundMessage> {
    normalize_with(raw, dedup, "group", extract_group)
}

fn normalize_with(
    raw: &Value,
    dedup: &mut DedupWindow,
    kind: &str,
    extract: fn(&Value, String) -> Result<Option<InboundMessage>>,
) -> Option<InboundMessage> {
    let id = match event_id(raw) {
        Ok(id) => id,
        Err(e) => {
            error!("Error handling QQ {} message: {:#}", kind, e);
            return None;
        }
    };
    if !dedup.seen(&id) {
        debug!("Ignoring duplicate QQ {} event: {}", kind, id);
        return None;
    }
    match extract(raw, id) {
        Ok(msg) => msg,
        Err(e) => {
            error!("Error handling QQ {} message: {:#}", kind, e);
            None
        }
    }
}

fn event_id(raw: &Value) -> Result<String> {
    match opt_str(raw, "id")? {
        Some(id) => Ok(id),
        None => bail!("event has no id"),
    }
}

fn extract_direct(raw: &Value, id: String) -> Result<Option<InboundMessage>> {
    let author = raw.get("author");
    let sender_id = match author {
        Some(author) => match opt_str(author, "id")? {
            Some(id) => id,
            None => opt_str(author, "user_openid")?.unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
        },
        None => UNKNOWN_SENDER.to_string(),
    };

    let content = content_of(raw)?;
    let content = content.trim();
    if content.is_empty() {
        debug!("Dropping empty QQ direct message {}", id);
        return Ok(None);
    }

    let mut metadata = Metadata::new();
    metadata.insert(META_MESSAGE_ID.to_string(), Value::String(id));

    Ok(Some(InboundMessage {
        channel: CHANNEL_NAME.to_string(),
        chat_id: sender_id.clone(),
        sender_id,
        content: content.to_string(),
        timestamp: Utc::now(),
        metadata,
    }))
}

fn extract_group(raw: &Value, id: String) -> Result<Option<InboundMessage>> {
    let Some(author) = raw.get("author") else {
        bail!("group event {} has no author", id);
    };
    let Some(member_openid) = opt_str(author, "member_openid")? else {
        bail!("group event {} has no author.member_openid", id);
    };
    let group_openid = match opt_str(raw, "group_openid")? {
        Some(group) => group,
        None => match opt_str(raw, "group_id")? {
            Some(group) => group,
            None => bail!("group event {} has no group_openid", id),
        },
    };

    let content = strip_mention(&content_of(raw)?);
    if content.is_empty() {
        debug!("Dropping empty QQ group message {}", id);
        return Ok(None);
    }

    debug!(
        "QQ group message from {} in group {}",
        member_openid, group_openid
    );

    let mut metadata = Metadata::new();
    metadata.insert(
        META_TARGET_KIND.to_string(),
        Value::String(TARGET_KIND_GROUP.to_string()),
    );
    metadata.insert(
        META_GROUP_ID.to_string(),
        Value::String(group_openid.clone()),
    );
    metadata.insert(META_MESSAGE_ID.to_string(), Value::String(id));

    Ok(Some(InboundMessage {
        channel: CHANNEL_NAME.to_string(),
        sender_id: member_openid,
        chat_id: group_openid,
        content,
        timestamp: Utc::now(),
        metadata,
    }))
}

/// Remove the mention marker the gateway leaves in front of group messages.
///
/// Trims, drops exactly one leading `/`, trims again.
pub fn strip_mention(content: &str) -> String {
    let trimmed = content.trim();
    trimmed
        .strip_prefix('/')
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// `content` as a string; missing or null counts as empty.
fn content_of(raw: &Value) -> Result<String> {
    match raw.get("content") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => bail!("content has unexpected type: {}", type_name(other)),
    }
}

/// Read an id-like field. Strings are taken as-is and numbers are
/// stringified; missing, null and empty values are `None`.
fn opt_str(value: &Value, key: &str) -> Result<Option<String>> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => bail!("field {} has unexpected type: {}", key, type_name(other)),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
