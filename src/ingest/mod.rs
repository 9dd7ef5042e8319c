// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::collections::HashMap;

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::{info, warn};

use crate::article::{Article, Cluster, MIN_CLUSTER_SIZE};
use crate::ingest::types::{ArticleFetcher, FetchedBatch};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "newswire_articles_fetched_total",
            "Valid articles parsed from the aggregation API."
        );
        describe_counter!(
            "newswire_articles_new_total",
            "Articles left after filtering against processed state."
        );
        describe_counter!(
            "newswire_fetch_errors_total",
            "Fetch or parse failures of the aggregation API."
        );
        describe_counter!("newswire_clusters_total", "Clusters found, by stage.");
        describe_counter!("newswire_oracle_calls_total", "Oracle completions, by purpose.");
        describe_counter!(
            "newswire_oracle_parse_failures_total",
            "Oracle replies without usable JSON, by purpose."
        );
        describe_counter!("newswire_publish_errors_total", "Collector POST failures.");
        describe_gauge!("newswire_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Remove a `NAME(...)` JSONP envelope. Text without the envelope is returned
/// unchanged (after trimming surrounding whitespace).
pub fn strip_callback<'a>(text: &'a str, name: &str) -> &'a str {
    let trimmed = text.trim();
    if !name.is_empty() {
        if let Some(inner) = trimmed
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('('))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return inner;
        }
    }
    let head: String = trimmed.chars().take(15).collect();
    warn!(callback = name, start = %head, "expected callback wrapper not found");
    trimmed
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default, rename = "recentActivityArticles")]
    recent_activity_articles: Option<Activity>,
}

#[derive(Debug, Deserialize)]
struct Activity {
    #[serde(default)]
    activity: Vec<serde_json::Value>,
}

/// An entry is valid when it carries `title`, `body` and `uri` keys and
/// deserializes as an `Article`.
fn valid_article(v: serde_json::Value) -> Option<Article> {
    let obj = v.as_object()?;
    if !(obj.contains_key("title") && obj.contains_key("body") && obj.contains_key("uri")) {
        return None;
    }
    serde_json::from_value(v).ok()
}

/// Partition valid articles into provider event groups and the residue.
pub fn partition_by_event(articles: Vec<Article>) -> FetchedBatch {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut events: Vec<(String, Cluster)> = Vec::new();
    let mut remaining = Vec::new();

    for a in &articles {
        match a.event_key() {
            Some(key) => match index.get(key) {
                Some(&i) => events[i].1.push(a.clone()),
                None => {
                    index.insert(key.to_string(), events.len());
                    events.push((key.to_string(), vec![a.clone()]));
                }
            },
            None => remaining.push(a.clone()),
        }
    }

    let pre_grouped = events
        .into_iter()
        .filter(|(_, g)| g.len() >= MIN_CLUSTER_SIZE)
        .map(|(event, g)| {
            info!(size = g.len(), %event, "Found event group");
            g
        })
        .collect();

    FetchedBatch {
        articles,
        pre_grouped,
        remaining,
    }
}

/// Parse an unwrapped payload `{ recentActivityArticles: { activity: [...] } }`.
pub fn parse_batch(json: &str) -> Result<FetchedBatch> {
    let env: Envelope = serde_json::from_str(json).context("parsing aggregation payload")?;
    let raw = env
        .recent_activity_articles
        .map(|a| a.activity)
        .unwrap_or_default();
    let total = raw.len();
    let valid: Vec<Article> = raw.into_iter().filter_map(valid_article).collect();
    info!(total, valid = valid.len(), "parsed aggregation payload");
    Ok(partition_by_event(valid))
}

/// Fetch + unwrap + parse. Never fails: any error yields an empty batch.
pub async fn fetch_batch(fetcher: &dyn ArticleFetcher, callback: &str) -> FetchedBatch {
    ensure_metrics_described();

    let raw = match fetcher.fetch_raw().await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = ?e, provider = fetcher.name(), "Error fetching articles");
            counter!("newswire_fetch_errors_total").increment(1);
            return FetchedBatch::default();
        }
    };

    match parse_batch(strip_callback(&raw, callback)) {
        Ok(batch) => {
            counter!("newswire_articles_fetched_total").increment(batch.articles.len() as u64);
            info!(
                pre_grouped = batch.pre_grouped.len(),
                remaining = batch.remaining.len(),
                "Articles pre-grouped by eventUri"
            );
            batch
        }
        Err(e) => {
            let head: String = raw.chars().take(100).collect();
            warn!(error = ?e, snippet = %head, "JSON parsing error");
            counter!("newswire_fetch_errors_total").increment(1);
            FetchedBatch::default()
        }
    }
}

pub(crate) fn record_run_ts() {
    let now = chrono::Utc::now().timestamp().max(0) as f64;
    gauge!("newswire_last_run_ts").set(now);
}
