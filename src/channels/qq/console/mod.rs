//! Local stdin/stdout stand-in for the QQ gateway.
//!
//! Each input line is delivered as a direct message from [`CONSOLE_USER`].
//! A line of the form `@<group_openid> text` is delivered as a group mention
//! instead, with the gateway's `/` mention prefix in front of the text.
//!
//! End of input does not end the connection: the transport stays `Ready` so
//! replies to piped input still print, until the channel is stopped.

use super::transport::{ConnectionEventSink, QqCredentials, QqTransport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

pub const CONSOLE_USER: &str = "console-user";
pub const CONSOLE_BOT: &str = "ConsoleBot";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    Direct(Value),
    Group(Value),
}

/// Turn one input line into a gateway-shaped event. Blank lines yield `None`.
pub fn parse_console_line(line: &str, seq: u64) -> Option<ConsoleEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let id = format!("console-{}", seq);

    if let Some(rest) = line.strip_prefix('@') {
        let (group, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if !group.is_empty() {
            return Some(ConsoleEvent::Group(json!({
                "id": id,
                "group_openid": group,
                "author": {"member_openid": CONSOLE_USER},
                "content": format!("/{}", text.trim()),
            })));
        }
    }

    Some(ConsoleEvent::Direct(json!({
        "id": id,
        "author": {"id": CONSOLE_USER, "user_openid": CONSOLE_USER},
        "content": line,
    })))
}

pub fn format_direct_send(openid: &str, content: &str) -> String {
    format!("[qq -> {}] {}", openid, content)
}

pub fn format_group_send(group_openid: &str, content: &str, reply_to: Option<&str>) -> String {
    match reply_to {
        Some(id) => format!("[qq -> group {} re {}] {}", group_openid, id, content),
        None => format!("[qq -> group {}] {}", group_openid, content),
    }
}

/// Feed every line of `reader` to `sink` until EOF.
pub async fn pump_lines<R>(
    reader: R,
    sink: &dyn ConnectionEventSink,
    seq: &AtomicU64,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read console input")?
    {
        let n = seq.fetch_add(1, Ordering::SeqCst);
        match parse_console_line(&line, n) {
            Some(ConsoleEvent::Direct(raw)) => sink.on_direct_message(raw).await,
            Some(ConsoleEvent::Group(raw)) => sink.on_group_message(raw).await,
            None => {}
        }
    }
    debug!("console input reached EOF");
    Ok(())
}

/// Pump `reader` to `sink`, then hold the connection open once input ends.
///
/// `closed` records EOF so a later call skips straight to idling instead of
/// re-reading an exhausted input. Only read errors return.
pub async fn serve_lines<R>(
    reader: R,
    sink: &dyn ConnectionEventSink,
    seq: &AtomicU64,
    closed: &AtomicBool,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    if !closed.load(Ordering::SeqCst) {
        pump_lines(reader, sink, seq).await?;
        if !closed.swap(true, Ordering::SeqCst) {
            info!("Console input closed, staying connected for replies");
        }
    }
    std::future::pending::<()>().await;
    Ok(())
}

#[derive(Default)]
pub struct ConsoleTransport {
    seq: AtomicU64,
    input_closed: AtomicBool,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn write_line(&self, line: String) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl QqTransport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    async fn connect(
        &self,
        credentials: &QqCredentials,
        sink: Arc<dyn ConnectionEventSink>,
    ) -> Result<()> {
        info!(
            "Console transport connected for app {}. Type a message, or '@<group> text' for a group mention",
            credentials.app_id
        );
        sink.on_ready(CONSOLE_BOT).await;
        serve_lines(
            BufReader::new(tokio::io::stdin()),
            sink.as_ref(),
            &self.seq,
            &self.input_closed,
        )
        .await
    }

    async fn send_direct(&self, openid: &str, content: &str) -> Result<()> {
        self.write_line(format_direct_send(openid, content)).await
    }

    async fn send_group(
        &self,
        group_openid: &str,
        content: &str,
        reply_to: Option<&str>,
    ) -> Result<()> {
        self.write_line(format_group_send(group_openid, content, reply_to))
            .await
    }
}
