//! QQ bot channel.
//!
//! The transport delivers raw gateway events to [`QqEventHandler`], which
//! deduplicates, normalizes, filters by `allowFrom` and publishes to the bus.
//! Outbound messages are routed by [`outbound::dispatch`].

pub mod console;
pub mod dedup;
pub mod normalize;
pub mod outbound;
pub mod supervisor;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

use crate::bus::queue::publish_inbound;
use crate::bus::{InboundMessage, OutboundMessage};
use crate::channels::base::BaseChannel;
use crate::channels::utils::check_allowed_sender;
use crate::config::QqConfig;
use anyhow::Result;
use async_trait::async_trait;
use dedup::DedupWindow;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use supervisor::{ConnectionState, Supervisor};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use transport::{ConnectionEventSink, QqCredentials, QqTransport};

pub use console::ConsoleTransport;

pub const CHANNEL_NAME: &str = "qq";

/// Build the transport named by `channels.qq.transport`.
pub fn transport_from_config(config: &QqConfig) -> Option<Arc<dyn QqTransport>> {
    match config.transport.trim() {
        "console" => Some(Arc::new(ConsoleTransport::new())),
        other => {
            warn!("unknown QQ transport '{}'", other);
            None
        }
    }
}

/// Transport callback handler shared with the connection task.
pub struct QqEventHandler {
    inbound_tx: Arc<mpsc::Sender<InboundMessage>>,
    dedup: Arc<Mutex<DedupWindow>>,
    allow_from: Vec<String>,
}

impl QqEventHandler {
    fn normalize(&self, raw: &Value, group: bool) -> Option<InboundMessage> {
        // Never held across an await
        let mut dedup = self.dedup.lock().unwrap_or_else(PoisonError::into_inner);
        if group {
            normalize::normalize_group(raw, &mut dedup)
        } else {
            normalize::normalize_direct(raw, &mut dedup)
        }
    }

    async fn accept(&self, msg: Option<InboundMessage>) {
        let Some(msg) = msg else {
            return;
        };
        if !check_allowed_sender(&msg.sender_id, &self.allow_from) {
            debug!("QQ: ignoring message from {} (not in allowFrom)", msg.sender_id);
            return;
        }
        info!("QQ: received message from {} in {}", msg.sender_id, msg.chat_id);
        if let Err(e) = publish_inbound(&self.inbound_tx, msg).await {
            error!("Failed to publish QQ message: {:#}", e);
        }
    }
}

#[async_trait]
impl ConnectionEventSink for QqEventHandler {
    async fn on_ready(&self, bot_name: &str) {
        debug!("QQ handler notified ready for {}", bot_name);
    }

    async fn on_direct_message(&self, raw: Value) {
        let msg = self.normalize(&raw, false);
        self.accept(msg).await;
    }

    async fn on_group_message(&self, raw: Value) {
        let msg = self.normalize(&raw, true);
        self.accept(msg).await;
    }
}

pub struct QqChannel {
    config: QqConfig,
    inbound_tx: Arc<mpsc::Sender<InboundMessage>>,
    transport: Option<Arc<dyn QqTransport>>,
    dedup: Arc<Mutex<DedupWindow>>,
    supervisor: Supervisor,
}

impl QqChannel {
    /// Channel using the transport named in `config`.
    pub fn new(config: QqConfig, inbound_tx: Arc<mpsc::Sender<InboundMessage>>) -> Self {
        let transport = transport_from_config(&config);
        Self::build(config, inbound_tx, transport)
    }

    /// Channel using an explicit transport.
    pub fn with_transport(
        config: QqConfig,
        inbound_tx: Arc<mpsc::Sender<InboundMessage>>,
        transport: Arc<dyn QqTransport>,
    ) -> Self {
        Self::build(config, inbound_tx, Some(transport))
    }

    fn build(
        config: QqConfig,
        inbound_tx: Arc<mpsc::Sender<InboundMessage>>,
        transport: Option<Arc<dyn QqTransport>>,
    ) -> Self {
        let dedup = Arc::new(Mutex::new(DedupWindow::new(config.dedup_capacity)));
        let supervisor = Supervisor::new(Duration::from_secs(config.reconnect_delay_secs));
        Self {
            config,
            inbound_tx,
            transport,
            dedup,
            supervisor,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.supervisor.subscribe()
    }

    /// Replace the reconnect backoff. Ignored while running.
    pub fn set_reconnect_delay(&mut self, delay: Duration) {
        if !self.supervisor.set_reconnect_delay(delay) {
            warn!("QQ reconnect delay cannot change while running");
        }
    }

    fn handler(&self) -> Arc<QqEventHandler> {
        Arc::new(QqEventHandler {
            inbound_tx: self.inbound_tx.clone(),
            dedup: self.dedup.clone(),
            allow_from: self.config.allow_from.clone(),
        })
    }
}

#[async_trait]
impl BaseChannel for QqChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn start(&mut self) -> Result<()> {
        let Some(transport) = self.transport.clone() else {
            error!(
                "QQ transport '{}' not available, channel stays stopped",
                self.config.transport
            );
            return Ok(());
        };
        let Some(credentials) = QqCredentials::from_config(&self.config) else {
            error!("QQ appId and secret not configured");
            return Ok(());
        };
        if self.supervisor.is_running() {
            warn!("QQ channel already running");
            return Ok(());
        }

        self.dedup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        self.supervisor.start(transport, credentials, self.handler());
        info!(
            "QQ bot started (C2C + group chat), reconnect delay {:?}",
            self.supervisor.reconnect_delay()
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.supervisor.stop().await;
        info!("QQ bot stopped");
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<()> {
        let Some(transport) = self.transport.as_deref() else {
            warn!("QQ client not initialized");
            return Ok(());
        };
        outbound::dispatch(transport, self.state(), msg).await;
        Ok(())
    }
}
