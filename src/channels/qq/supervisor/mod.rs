//! Connection lifecycle for the QQ gateway.
//!
//! ```text
//! Stopped -> Connecting -> Ready
//!               ^            |
//!               |            v
//!               +----- Reconnecting
//! ```
//!
//! Any state goes to `Stopped` on [`Supervisor::stop`].

use super::transport::{ConnectionEventSink, QqCredentials, QqTransport};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Stopped,
    Connecting,
    Ready,
    Reconnecting,
}

/// Move `Connecting` to `Ready`. Any other state is left alone, so a late
/// ready callback cannot revive a stopped connection.
pub fn mark_ready(state_tx: &watch::Sender<ConnectionState>) -> bool {
    state_tx.send_if_modified(|state| {
        if *state == ConnectionState::Connecting {
            *state = ConnectionState::Ready;
            true
        } else {
            false
        }
    })
}

/// Forwards transport callbacks and records readiness.
struct ReadyTracker {
    inner: Arc<dyn ConnectionEventSink>,
    state_tx: Arc<watch::Sender<ConnectionState>>,
}

#[async_trait]
impl ConnectionEventSink for ReadyTracker {
    async fn on_ready(&self, bot_name: &str) {
        if mark_ready(&self.state_tx) {
            info!("QQ bot ready: {}", bot_name);
        }
        self.inner.on_ready(bot_name).await;
    }

    async fn on_direct_message(&self, raw: Value) {
        self.inner.on_direct_message(raw).await;
    }

    async fn on_group_message(&self, raw: Value) {
        self.inner.on_group_message(raw).await;
    }
}

pub struct Supervisor {
    state_tx: Arc<watch::Sender<ConnectionState>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    reconnect_delay: Duration,
}

impl Supervisor {
    pub fn new(reconnect_delay: Duration) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Stopped);
        Self {
            state_tx: Arc::new(state_tx),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            reconnect_delay,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Change the backoff used by the next [`Supervisor::start`]. Refused
    /// while a connection task is running. Existing state subscribers stay
    /// attached.
    pub fn set_reconnect_delay(&mut self, delay: Duration) -> bool {
        if self.handle.is_some() {
            return false;
        }
        self.reconnect_delay = delay;
        true
    }

    /// Spawn the connection task. Returns without waiting for `Ready`.
    /// A no-op if a task is already running.
    pub fn start(
        &mut self,
        transport: Arc<dyn QqTransport>,
        credentials: QqCredentials,
        sink: Arc<dyn ConnectionEventSink>,
    ) {
        if self.handle.is_some() {
            debug!("QQ supervisor already running");
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        self.state_tx.send_replace(ConnectionState::Connecting);

        let sink: Arc<dyn ConnectionEventSink> = Arc::new(ReadyTracker {
            inner: sink,
            state_tx: self.state_tx.clone(),
        });
        let state_tx = self.state_tx.clone();
        let running = self.running.clone();
        let delay = self.reconnect_delay;

        self.handle = Some(tokio::spawn(async move {
            run_connection_loop(transport, credentials, sink, state_tx, running, delay).await;
        }));
    }

    /// Clear the run flag, abort the task and wait for it to unwind.
    pub async fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => warn!("QQ connection task ended abnormally: {}", e),
            }
        }
        self.state_tx.send_replace(ConnectionState::Stopped);
    }
}

async fn run_connection_loop(
    transport: Arc<dyn QqTransport>,
    credentials: QqCredentials,
    sink: Arc<dyn ConnectionEventSink>,
    state_tx: Arc<watch::Sender<ConnectionState>>,
    running: Arc<AtomicBool>,
    delay: Duration,
) {
    while running.load(Ordering::SeqCst) {
        state_tx.send_replace(ConnectionState::Connecting);
        debug!("Connecting to QQ via {} transport", transport.name());
        match transport.connect(&credentials, sink.clone()).await {
            Ok(()) => warn!("QQ connection closed"),
            Err(e) => warn!("QQ bot error: {:#}", e),
        }
        if !running.load(Ordering::SeqCst) {
            break;
        }
        state_tx.send_replace(ConnectionState::Reconnecting);
        info!("Reconnecting QQ bot in {:?}...", delay);
        tokio::time::sleep(delay).await;
    }
}
