// src/notify/collector.rs
use anyhow::{Context, Result};
use reqwest::Client;
use std::sync::Mutex;
use std::time::Duration;

use super::ResultPublisher;
use crate::config::PipelineConfig;
use crate::digest::NewsPayload;

/// Posts digests to the collector's `POST /api/news`.
#[derive(Clone)]
pub struct CollectorPublisher {
    endpoint: String,
    client: Client,
    connect_timeout: Duration,
    timeout: Duration,
}

impl CollectorPublisher {
    /// Endpoint and both timeouts come from the pipeline config.
    pub fn from_config(cfg: &PipelineConfig) -> Result<Self> {
        let connect_timeout = Duration::from_secs(cfg.connect_timeout_secs.max(1));
        let timeout = Duration::from_secs(cfg.http_timeout_secs.max(1));
        let client = Client::builder()
            .user_agent("newswire-digest/0.1")
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()
            .context("building collector http client")?;
        Ok(Self {
            endpoint: cfg.collector_endpoint.clone(),
            client,
            connect_timeout,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait::async_trait]
impl ResultPublisher for CollectorPublisher {
    async fn publish(&self, payload: &NewsPayload) -> Result<()> {
        let rsp = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .context("collector post")?;
        tracing::info!(status = %rsp.status(), "API response status");
        rsp.error_for_status().context("collector non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Keeps published payloads in memory (demo runs, tests).
#[derive(Default)]
pub struct MemoryPublisher {
    pub sent: Mutex<Vec<NewsPayload>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<NewsPayload> {
        self.sent.lock().expect("publisher poisoned").clone()
    }
}

#[async_trait::async_trait]
impl ResultPublisher for MemoryPublisher {
    async fn publish(&self, payload: &NewsPayload) -> Result<()> {
        self.sent
            .lock()
            .expect("publisher poisoned")
            .push(payload.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_settings_follow_pipeline_config() {
        let cfg = PipelineConfig {
            collector_endpoint: "http://collector:8000/api/news".into(),
            connect_timeout_secs: 3,
            http_timeout_secs: 12,
            ..PipelineConfig::default()
        };
        let p = CollectorPublisher::from_config(&cfg).unwrap();
        assert_eq!(p.endpoint(), "http://collector:8000/api/news");
        assert_eq!(p.connect_timeout(), Duration::from_secs(3));
        assert_eq!(p.timeout(), Duration::from_secs(12));
    }
}
