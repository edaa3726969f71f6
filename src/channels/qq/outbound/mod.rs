//! Route canonical outbound messages to QQ send calls.

use super::CHANNEL_NAME;
use super::supervisor::ConnectionState;
use super::transport::QqTransport;
use crate::bus::OutboundMessage;
use crate::bus::events::{
    META_GROUP_ID, META_MESSAGE_ID, META_TARGET_KIND, TARGET_KIND_DIRECT, TARGET_KIND_GROUP,
};
use crate::errors::BridgeError;
use tracing::{debug, error, warn};

/// The platform call an outbound message maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRoute<'a> {
    Direct {
        openid: &'a str,
        content: &'a str,
    },
    Group {
        group_openid: &'a str,
        content: &'a str,
        reply_to: Option<&'a str>,
    },
}

/// Decide where `msg` goes.
///
/// `target_kind == "group"` needs a string `group_id`; anything else is a
/// direct message to `chat_id`.
pub fn route(msg: &OutboundMessage) -> Result<OutboundRoute<'_>, BridgeError> {
    match msg.meta_str(META_TARGET_KIND) {
        Some(TARGET_KIND_GROUP) => {
            let Some(group_openid) = msg.meta_str(META_GROUP_ID).filter(|g| !g.is_empty()) else {
                return Err(BridgeError::Routing(format!(
                    "group message for {} has no {}",
                    msg.chat_id, META_GROUP_ID
                )));
            };
            let reply_to = msg
                .meta_str(META_MESSAGE_ID)
                .or(msg.reply_to.as_deref());
            Ok(OutboundRoute::Group {
                group_openid,
                content: &msg.content,
                reply_to,
            })
        }
        Some(TARGET_KIND_DIRECT) | None => Ok(direct_route(msg)),
        Some(other) => {
            debug!("unknown QQ target_kind '{}', sending direct", other);
            Ok(direct_route(msg))
        }
    }
}

fn direct_route(msg: &OutboundMessage) -> OutboundRoute<'_> {
    OutboundRoute::Direct {
        openid: &msg.chat_id,
        content: &msg.content,
    }
}

/// Send `msg` through `transport`. Fire-and-forget: failures are logged and
/// never retried or queued.
pub async fn dispatch(transport: &dyn QqTransport, state: ConnectionState, msg: &OutboundMessage) {
    if msg.channel != CHANNEL_NAME {
        debug!("QQ ignoring outbound message for channel {}", msg.channel);
        return;
    }
    if state != ConnectionState::Ready {
        warn!(
            "QQ not connected ({:?}), dropping message to {}",
            state, msg.chat_id
        );
        return;
    }

    let result = match route(msg) {
        Ok(OutboundRoute::Direct { openid, content }) => {
            debug!("QQ send_direct to {}", openid);
            transport.send_direct(openid, content).await
        }
        Ok(OutboundRoute::Group {
            group_openid,
            content,
            reply_to,
        }) => {
            debug!("QQ send_group to {} (reply_to={:?})", group_openid, reply_to);
            transport.send_group(group_openid, content, reply_to).await
        }
        Err(e) => {
            error!("Error sending QQ message: {}", e);
            return;
        }
    };

    if let Err(e) = result {
        let e = BridgeError::Transport(format!("{:#}", e));
        error!("Error sending QQ message to {}: {}", msg.chat_id, e);
    }
}

#[cfg(test)]
mod tests;
