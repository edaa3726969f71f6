use super::*;
use crate::bus::events::Metadata;
use crate::channels::qq::mock::{MockTransport, Sent};
use serde_json::json;
use std::sync::atomic::Ordering;

fn direct(chat_id: &str, content: &str) -> OutboundMessage {
    OutboundMessage {
        channel: "qq".to_string(),
        chat_id: chat_id.to_string(),
        content: content.to_string(),
        reply_to: None,
        metadata: Metadata::new(),
    }
}

fn group(group_id: &str, content: &str, message_id: Option<&str>) -> OutboundMessage {
    let mut msg = direct(group_id, content);
    msg.metadata
        .insert(META_TARGET_KIND.to_string(), json!(TARGET_KIND_GROUP));
    msg.metadata.insert(META_GROUP_ID.to_string(), json!(group_id));
    if let Some(id) = message_id {
        msg.metadata.insert(META_MESSAGE_ID.to_string(), json!(id));
    }
    msg
}

#[test]
fn test_route_direct_by_default() {
    let msg = direct("u1", "hi");
    assert_eq!(
        route(&msg).unwrap(),
        OutboundRoute::Direct {
            openid: "u1",
            content: "hi"
        }
    );
}

#[test]
fn test_route_explicit_direct_kind() {
    let mut msg = direct("u1", "hi");
    msg.metadata
        .insert(META_TARGET_KIND.to_string(), json!(TARGET_KIND_DIRECT));
    assert!(matches!(route(&msg).unwrap(), OutboundRoute::Direct { .. }));
}

#[test]
fn test_route_unknown_kind_goes_direct() {
    let mut msg = direct("u1", "hi");
    msg.metadata
        .insert(META_TARGET_KIND.to_string(), json!("channel"));
    msg.metadata.insert(META_GROUP_ID.to_string(), json!("G1"));
    assert_eq!(
        route(&msg).unwrap(),
        OutboundRoute::Direct {
            openid: "u1",
            content: "hi"
        }
    );
}

#[test]
fn test_route_group_with_reply() {
    let msg = group("G1", "hi", Some("m9"));
    assert_eq!(
        route(&msg).unwrap(),
        OutboundRoute::Group {
            group_openid: "G1",
            content: "hi",
            reply_to: Some("m9"),
        }
    );
}

#[test]
fn test_route_group_reply_to_falls_back_to_field() {
    let mut msg = group("G1", "hi", None);
    msg.reply_to = Some("m3".to_string());
    assert!(matches!(
        route(&msg).unwrap(),
        OutboundRoute::Group {
            reply_to: Some("m3"),
            ..
        }
    ));
}

#[test]
fn test_route_group_without_group_id_is_error() {
    let mut msg = direct("G1", "hi");
    msg.metadata
        .insert(META_TARGET_KIND.to_string(), json!(TARGET_KIND_GROUP));
    let err = route(&msg).unwrap_err();
    assert!(matches!(err, BridgeError::Routing(_)));

    msg.metadata.insert(META_GROUP_ID.to_string(), json!(12));
    assert!(route(&msg).is_err());
}

#[tokio::test]
async fn test_dispatch_group_sends_exactly_one_group_call() {
    let transport = MockTransport::default();
    dispatch(&transport, ConnectionState::Ready, &group("G1", "hello", Some("m1"))).await;
    assert_eq!(
        transport.sent(),
        vec![Sent::Group {
            group_openid: "G1".to_string(),
            content: "hello".to_string(),
            reply_to: Some("m1".to_string()),
        }]
    );
}

#[tokio::test]
async fn test_dispatch_direct_sends_exactly_one_direct_call() {
    let transport = MockTransport::default();
    dispatch(&transport, ConnectionState::Ready, &direct("u1", "hello")).await;
    assert_eq!(
        transport.sent(),
        vec![Sent::Direct {
            openid: "u1".to_string(),
            content: "hello".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_dispatch_not_ready_sends_nothing() {
    let transport = MockTransport::default();
    for state in [
        ConnectionState::Stopped,
        ConnectionState::Connecting,
        ConnectionState::Reconnecting,
    ] {
        dispatch(&transport, state, &direct("u1", "hello")).await;
    }
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_dispatch_routing_error_sends_nothing() {
    let transport = MockTransport::default();
    let mut msg = direct("G1", "hi");
    msg.metadata
        .insert(META_TARGET_KIND.to_string(), json!(TARGET_KIND_GROUP));
    dispatch(&transport, ConnectionState::Ready, &msg).await;
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_dispatch_send_error_swallowed() {
    let transport = MockTransport::default();
    transport.fail_sends.store(true, Ordering::SeqCst);
    // Must not panic or propagate
    dispatch(&transport, ConnectionState::Ready, &direct("u1", "hello")).await;
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_dispatch_ignores_other_channels() {
    let transport = MockTransport::default();
    let mut msg = direct("u1", "hello");
    msg.channel = "telegram".to_string();
    dispatch(&transport, ConnectionState::Ready, &msg).await;
    assert!(transport.sent().is_empty());
}
