use crate::bus::{InboundMessage, OutboundMessage};
use crate::channels::base::BaseChannel;
use crate::channels::qq::QqChannel;
use crate::config::Config;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct ChannelManager {
    channels: Vec<Box<dyn BaseChannel>>,
    enabled_channels: Vec<String>,
}

impl ChannelManager {
    pub fn new(config: &Config, inbound_tx: Arc<mpsc::Sender<InboundMessage>>) -> Self {
        let mut channels: Vec<Box<dyn BaseChannel>> = Vec::new();

        if config.channels.qq.enabled {
            tracing::debug!("Initializing QQ channel...");
            channels.push(Box::new(QqChannel::new(
                config.channels.qq.clone(),
                inbound_tx,
            )));
            tracing::info!("QQ channel enabled");
        }

        Self::with_channels(channels)
    }

    /// Manager over pre-built channels.
    pub fn with_channels(channels: Vec<Box<dyn BaseChannel>>) -> Self {
        let enabled_channels = channels.iter().map(|c| c.name().to_string()).collect();
        Self {
            channels,
            enabled_channels,
        }
    }

    pub fn enabled_channels(&self) -> &[String] {
        &self.enabled_channels
    }

    pub async fn start_all(&mut self) -> Result<()> {
        for channel in &mut self.channels {
            let channel_name = channel.name().to_string();
            tracing::info!("Starting channel: {}", channel_name);
            if let Err(e) = channel.start().await {
                tracing::error!("Failed to start channel {}: {}", channel_name, e);
                return Err(anyhow::anyhow!(
                    "Failed to start channel {}: {}",
                    channel_name,
                    e
                ));
            }
            tracing::info!("Channel {} started", channel_name);
        }
        Ok(())
    }

    /// Stop every channel, continuing past failures. Returns the first error.
    pub async fn stop_all(&mut self) -> Result<()> {
        let mut first_err = None;
        for channel in &mut self.channels {
            if let Err(e) = channel.stop().await {
                tracing::error!("Failed to stop channel {}: {}", channel.name(), e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Hand `msg` to the channel it names. Sends are not retried.
    pub async fn send(&self, msg: &OutboundMessage) -> Result<()> {
        tracing::debug!(
            "ChannelManager.send: channel={}, chat_id={}, content_len={}",
            msg.channel,
            msg.chat_id,
            msg.content.len()
        );
        let Some(channel) = self.channels.iter().find(|c| c.name() == msg.channel) else {
            tracing::error!(
                "No channel found for: {} (available channels: {:?})",
                msg.channel,
                self.enabled_channels
            );
            anyhow::bail!("No channel found for: {}", msg.channel);
        };
        channel.send(msg).await
    }

    /// Deliver outbound messages until every sender is dropped.
    pub async fn dispatch_outbound(&self, mut rx: mpsc::Receiver<OutboundMessage>) {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = self.send(&msg).await {
                tracing::error!("Error dispatching outbound message: {}", e);
            }
        }
        tracing::debug!("outbound dispatch loop finished");
    }
}
