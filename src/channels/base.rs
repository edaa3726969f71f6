use crate::bus::OutboundMessage;
use async_trait::async_trait;

#[async_trait]
pub trait BaseChannel: Send + Sync {
    fn name(&self) -> &str;

    /// Begin receiving. Returns once the background work is spawned.
    async fn start(&mut self) -> anyhow::Result<()>;
    /// Stop receiving. Safe to call at any time, including repeatedly.
    async fn stop(&mut self) -> anyhow::Result<()>;
    async fn send(&self, msg: &OutboundMessage) -> anyhow::Result<()>;
}
