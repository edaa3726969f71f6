//! Scripted transport for unit tests.

use super::transport::{ConnectionEventSink, QqCredentials, QqTransport};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
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

/// Fails `connect` a set number of times, then reports ready and holds the
/// connection open until the task is aborted.
#[derive(Default)]
pub struct MockTransport {
    failures_left: AtomicUsize,
    pub connect_calls: AtomicUsize,
    pub fail_sends: AtomicBool,
    sink: Mutex<Option<Arc<dyn ConnectionEventSink>>>,
    sent: Mutex<Vec<Sent>>,
}

impl MockTransport {
    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub fn sink(&self) -> Option<Arc<dyn ConnectionEventSink>> {
        self.sink.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<Sent> {
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
    ) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            anyhow::bail!("mock connect failure");
        }
        *self.sink.lock().unwrap() = Some(sink.clone());
        sink.on_ready("mockbot").await;
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn send_direct(&self, openid: &str, content: &str) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            anyhow::bail!("mock send failure");
        }
        self.sent.lock().unwrap().push(Sent::Direct {
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
    ) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            anyhow::bail!("mock send failure");
        }
        self.sent.lock().unwrap().push(Sent::Group {
            group_openid: group_openid.to_string(),
            content: content.to_string(),
            reply_to: reply_to.map(ToString::to_string),
        });
        Ok(())
    }
}
