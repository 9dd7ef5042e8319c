// src/notify/mod.rs
//! Delivery of finished digests.

pub mod collector;

use anyhow::Result;

use crate::digest::NewsPayload;

pub use collector::{CollectorPublisher, MemoryPublisher};

#[async_trait::async_trait]
pub trait ResultPublisher: Send + Sync {
    /// Single attempt; no retries.
    async fn publish(&self, payload: &NewsPayload) -> Result<()>;
    fn name(&self) -> &'static str;
}
