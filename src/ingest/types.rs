// src/ingest/types.rs
use anyhow::Result;

use crate::article::{Article, Cluster};

/// Parsed fetch output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedBatch {
    /// Every valid article, provider order.
    pub articles: Vec<Article>,
    /// Provider event groups with at least two members, first-seen order.
    pub pre_grouped: Vec<Cluster>,
    /// Valid articles without an event URI. Diagnostics only: the grouper
    /// receives every new article, so singleton-event articles still compete.
    pub remaining: Vec<Article>,
}

impl FetchedBatch {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Raw text source for one aggregation API response.
#[async_trait::async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch_raw(&self) -> Result<String>;
    fn name(&self) -> &'static str;
}
