// src/ingest/providers/event_registry.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::config::PipelineConfig;
use crate::ingest::types::ArticleFetcher;

/// Minute-stream fetcher for the EventRegistry aggregation API.
pub struct EventRegistryFetcher {
    client: reqwest::Client,
    url: String,
    query: String,
    lookback_mins: u32,
    api_key: String,
    callback: String,
}

impl EventRegistryFetcher {
    pub fn from_config(cfg: &PipelineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("newswire-digest/0.1")
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .context("building fetch http client")?;
        Ok(Self {
            client,
            url: cfg.fetch_url.clone(),
            query: cfg.query.clone(),
            lookback_mins: cfg.lookback_mins,
            api_key: cfg.api_key.clone(),
            callback: cfg.callback.clone(),
        })
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("query", self.query.clone()),
            (
                "recentActivityArticlesUpdatesAfterMinsAgo",
                self.lookback_mins.to_string(),
            ),
            ("apiKey", self.api_key.clone()),
            ("callback", self.callback.clone()),
        ]
    }
}

#[async_trait]
impl ArticleFetcher for EventRegistryFetcher {
    async fn fetch_raw(&self) -> Result<String> {
        info!(url = %self.url, lookback_mins = self.lookback_mins, "Fetching articles");
        let resp = self
            .client
            .get(&self.url)
            .query(&self.params())
            .send()
            .await
            .context("event registry get()")?;
        info!(status = %resp.status(), "aggregation API responded");
        let resp = resp.error_for_status().context("event registry non-2xx")?;
        resp.text().await.context("event registry .text()")
    }

    fn name(&self) -> &'static str {
        "EventRegistry"
    }
}
