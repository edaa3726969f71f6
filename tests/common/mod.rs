// Shared test helpers; not all items used by every test binary.
#![allow(unused)]

use async_trait::async_trait;
use qqbridge::bus::InboundMessage;
use qqbridge::channels::qq::QqChannel;
use qqbridge::channels::qq::supervisor::ConnectionState;
use qqbridge::channels::qq::transport::{ConnectionEventSink, QqCredentials, QqTransport};
use qqbridge::config::QqConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentCall {
    Direct {
        openid: String,
        content: String,
    },
    Group {
        group_openid: String,
        content: String,
        reply_to: Option<String>,
    },
}

/// Transport double: fails `connect` a scripted number of times, then reports
/// ready and stays connected until aborted. Records every send.
#[derive(Default)]
pub struct MockTransport {
    failures_left: AtomicUsize,
    pub connect_calls: AtomicUsize,
    sink: Mutex<Option<Arc<dyn ConnectionEventSink>>>,
    pub sent: Mutex<Vec<SentCall>>,
}

impl MockTransport {
    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub fn sink(&self) -> Arc<dyn ConnectionEventSink> {
        self.sink
            .lock()
            .unwrap()
            .clone()
            .expect("transport not connected")
    }

    pub fn sent(&self) -> Vec<SentCall> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl QqTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(
        &self,
        _credentials: &QqCredentials,
        sink: Arc<dyn ConnectionEventSink>,
    ) -> anyhow::Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            anyhow::bail!("scripted connect failure");
        }
        *self.sink.lock().unwrap() = Some(sink.clone());
        sink.on_ready("testbot").await;
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn send_direct(&self, openid: &str, content: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(SentCall::Direct {
            openid: openid.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn send_group(
        &self,
        group_openid: &str,
        content: &str,
        reply_to: Option<&str>,
    ) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(SentCall::Group {
            group_openid: group_openid.to_string(),
            content: content.to_string(),
            reply_to: reply_to.map(str::to_string),
        });
        Ok(())
    }
}

pub fn qq_config() -> QqConfig {
    QqConfig {
        enabled: true,
        app_id: "102000".to_string(),
        secret: "test-secret".to_string(),
        ..QqConfig::default()
    }
}

/// A channel over `transport` with a millisecond reconnect delay.
pub fn test_channel(
    transport: Arc<MockTransport>,
) -> (QqChannel, mpsc::Receiver<InboundMessage>) {
    let (tx, rx) = mpsc::channel(32);
    let mut channel = QqChannel::with_transport(qq_config(), Arc::new(tx), transport);
    channel.set_reconnect_delay(Duration::from_millis(5));
    (channel, rx)
}

pub async fn wait_for_state(channel: &QqChannel, want: ConnectionState) {
    let mut rx = channel.subscribe_state();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| *s == want))
        .await
        .expect("timed out waiting for connection state")
        .expect("state channel closed");
}
