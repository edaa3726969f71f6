use crate::bus::{InboundMessage, OutboundMessage};
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const DEFAULT_INBOUND_CAPACITY: usize = 1000;
const DEFAULT_OUTBOUND_CAPACITY: usize = 1000;
/// Timeout for bus send operations to prevent indefinite blocking
/// when the consumer is slow or stalled.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// In-process publish/subscribe bus between channels and the host.
///
/// Channels hold clones of `inbound_tx`; the host takes the inbound receiver.
/// The host publishes replies on the outbound side, which the channel manager
/// drains. Each receiver can be taken exactly once.
pub struct MessageBus {
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: Option<mpsc::Receiver<InboundMessage>>,
    pub outbound_tx: mpsc::Sender<OutboundMessage>,
    outbound_rx: Option<mpsc::Receiver<OutboundMessage>>,
}

impl MessageBus {
    pub fn new(inbound_capacity: usize, outbound_capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(inbound_capacity.max(1));
        let (outbound_tx, outbound_rx) = mpsc::channel(outbound_capacity.max(1));
        Self {
            inbound_tx,
            inbound_rx: Some(inbound_rx),
            outbound_tx,
            outbound_rx: Some(outbound_rx),
        }
    }

    /// Extract the inbound receiver to avoid holding lock during await
    pub fn take_inbound_rx(&mut self) -> Option<mpsc::Receiver<InboundMessage>> {
        self.inbound_rx.take()
    }

    /// Extract the outbound receiver. The returned stream is infinite while any
    /// sender is alive and cannot be restarted once taken.
    pub fn take_outbound_rx(&mut self) -> Option<mpsc::Receiver<OutboundMessage>> {
        self.outbound_rx.take()
    }

    pub async fn publish_inbound(&self, msg: InboundMessage) -> Result<()> {
        publish_inbound(&self.inbound_tx, msg).await
    }

    pub async fn publish_outbound(&self, msg: OutboundMessage) -> Result<()> {
        let channel = msg.channel.clone();
        let chat_id = msg.chat_id.clone();
        tokio::time::timeout(SEND_TIMEOUT, self.outbound_tx.send(msg))
            .await
            .map_err(|_| {
                warn!(
                    "outbound send timed out after {}s, queue full",
                    SEND_TIMEOUT.as_secs()
                );
                anyhow::anyhow!("outbound send timed out: queue full")
            })?
            .context("Failed to send outbound message - receiver closed")?;
        debug!(
            "outbound message queued: channel={}, chat_id={}",
            channel, chat_id
        );
        Ok(())
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_INBOUND_CAPACITY, DEFAULT_OUTBOUND_CAPACITY)
    }
}

/// Publish one inbound message through a sender handle, bounded by [`SEND_TIMEOUT`].
///
/// Channels only hold the sender half, so this is shared between the bus and
/// the channel event handlers.
pub async fn publish_inbound(tx: &mpsc::Sender<InboundMessage>, msg: InboundMessage) -> Result<()> {
    let channel = msg.channel.clone();
    let sender_id = msg.sender_id.clone();
    tokio::time::timeout(SEND_TIMEOUT, tx.send(msg))
        .await
        .map_err(|_| {
            warn!(
                "inbound send timed out after {}s, queue full or consumer stalled",
                SEND_TIMEOUT.as_secs()
            );
            anyhow::anyhow!("inbound send timed out: queue full")
        })?
        .context("Failed to send inbound message - receiver closed")?;
    debug!(
        "inbound message queued: channel={}, sender={}",
        channel, sender_id
    );
    Ok(())
}
