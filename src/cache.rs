// src/cache.rs
//! Dedup state carried between runs:
//! - `ProcessedSet`: bounded, insertion-ordered list of summarized identities.
//! - `ArticleCache`: legacy `{"articles": {id: {...}}}` map kept alongside it.
//!   Write-only from the pipeline's point of view; it is pruned to the
//!   identities the processed set still holds, so it shares the same bound.
//!
//! Both key on `Article::identity`, so a URI-less article hashes the same way
//! on lookup, insertion and filtering.

use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::article::Article;
use crate::store::StateFiles;

pub const DEFAULT_PROCESSED_CAP: usize = 1000;
pub const PROCESSED_FILE: &str = "processed_articles.json";
pub const LEGACY_CACHE_FILE: &str = "cache.json";

#[derive(Debug, Clone)]
pub struct ProcessedSet {
    order: Vec<String>,
    seen: HashSet<String>,
    cap: usize,
}

impl Default for ProcessedSet {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_PROCESSED_CAP)
    }
}

impl ProcessedSet {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            order: Vec::with_capacity(cap.min(10_000)),
            seen: HashSet::new(),
            cap: cap.max(1),
        }
    }

    /// Build from a stored list. Duplicates keep their first position; a list
    /// longer than the cap keeps its most recent entries.
    pub fn from_ids<I: IntoIterator<Item = String>>(ids: I, cap: usize) -> Self {
        let mut set = Self::with_capacity(cap);
        for id in ids {
            set.insert_identity(id);
        }
        set
    }

    /// Missing or unreadable state yields an empty set.
    pub fn load(files: &dyn StateFiles, name: &str, cap: usize) -> Self {
        let ids: Vec<String> = match files.read(name) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(v) => v,
                Err(e) => {
                    info!(file = name, error = %e, "processed list unreadable, starting empty");
                    Vec::new()
                }
            },
            Err(_) => {
                info!(file = name, "No processed articles file found, creating a new one");
                Vec::new()
            }
        };
        Self::from_ids(ids, cap)
    }

    pub fn save(&self, files: &dyn StateFiles, name: &str) -> Result<()> {
        let json = serde_json::to_string(&self.order).context("serializing processed list")?;
        files
            .write(name, &json)
            .with_context(|| format!("writing {name}"))
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.seen.contains(identity)
    }

    pub fn is_new(&self, article: &Article) -> bool {
        !self.contains(&article.identity())
    }

    /// Append the article's identity if absent, then evict oldest entries
    /// beyond the cap.
    pub fn record_processed(&mut self, article: &Article) {
        self.insert_identity(article.identity());
    }

    fn insert_identity(&mut self, id: String) {
        if !self.seen.insert(id.clone()) {
            return;
        }
        self.order.push(id);
        if self.order.len() > self.cap {
            let excess = self.order.len() - self.cap;
            for old in self.order.drain(0..excess) {
                self.seen.remove(&old);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Identities oldest-first.
    pub fn ids(&self) -> &[String] {
        &self.order
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedArticle {
    pub title: String,
    pub date_processed: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleCache {
    #[serde(default)]
    pub articles: BTreeMap<String, CachedArticle>,
}

impl ArticleCache {
    pub fn load(files: &dyn StateFiles, name: &str) -> Self {
        match files.read(name) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                info!(file = name, error = %e, "cache file unreadable, creating a new cache");
                Self::default()
            }),
            Err(_) => {
                info!(file = name, "Cache file not found. Creating a new cache.");
                Self::default()
            }
        }
    }

    pub fn save(&self, files: &dyn StateFiles, name: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing article cache")?;
        files
            .write(name, &json)
            .with_context(|| format!("writing {name}"))
    }

    pub fn contains(&self, article: &Article) -> bool {
        self.articles.contains_key(&article.identity())
    }

    pub fn cache_article(&mut self, article: &Article, summary: &str) {
        let id = article.identity();
        debug!(%id, "caching article");
        self.articles.insert(
            id,
            CachedArticle {
                title: article.title.clone(),
                date_processed: chrono::Utc::now().to_rfc3339(),
                summary: summary.to_string(),
            },
        );
    }

    /// Drop every entry the processed set no longer holds.
    pub fn retain_processed(&mut self, processed: &ProcessedSet) {
        let before = self.articles.len();
        self.articles.retain(|id, _| processed.contains(id));
        let dropped = before - self.articles.len();
        if dropped > 0 {
            debug!(dropped, "pruned legacy cache to processed set");
        }
    }

    /// Articles not present in the cache, input order preserved.
    pub fn filter_new(&self, articles: &[Article]) -> Vec<Article> {
        articles
            .iter()
            .filter(|a| !self.contains(a))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
