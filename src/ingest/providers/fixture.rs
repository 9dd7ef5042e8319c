// src/ingest/providers/fixture.rs
use anyhow::Result;
use async_trait::async_trait;

use crate::ingest::types::ArticleFetcher;

/// Serves a fixed response body (tests, demo runs).
pub struct FixtureFetcher {
    pub content: String,
}

impl FixtureFetcher {
    pub fn from_fixture(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }
}

#[async_trait]
impl ArticleFetcher for FixtureFetcher {
    async fn fetch_raw(&self) -> Result<String> {
        Ok(self.content.clone())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
