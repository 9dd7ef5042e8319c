//! # Pipeline
//! One run: fetch → drop already-processed (processed set only) → group → summarize each cluster →
//! persist processed state → publish.
//!
//! Only the fetch may end a run early. Oracle trouble degrades to fallbacks,
//! and a failed publish does not undo the processed-state bookkeeping, which
//! is saved first.

use std::sync::Arc;

use anyhow::Result;
use metrics::counter;
use tracing::{info, warn};

use crate::analyze::ai_adapter::DynOracle;
use crate::analyze::grouping::ArticleGrouper;
use crate::analyze::summarize::ArticleSummarizer;
use crate::article::{Article, Cluster, MIN_CLUSTER_SIZE};
use crate::cache::{ArticleCache, ProcessedSet};
use crate::config::PipelineConfig;
use crate::digest::{NewsPayload, SummaryArtifact};
use crate::ingest::{self, types::ArticleFetcher};
use crate::notify::ResultPublisher;
use crate::store::StateFiles;

pub const REPLY_NO_ARTICLES: &str = "No new articles found.";
pub const REPLY_NOTHING_NEW: &str = "No new articles to process.";
pub const REPLY_NO_GROUPS: &str = "No article groups with multiple sources were found. Try adjusting the search criteria or checking back later.";

/// Outcome of one run, including the messages meant for the operator.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub fetched: usize,
    pub new_articles: usize,
    pub clusters: usize,
    pub results: Vec<SummaryArtifact>,
    pub published: bool,
    pub replies: Vec<String>,
}

impl RunReport {
    fn reply(mut self, msg: &str) -> Self {
        self.replies.push(msg.to_string());
        self
    }
}

pub struct Pipeline {
    fetcher: Box<dyn ArticleFetcher>,
    grouper: ArticleGrouper,
    summarizer: ArticleSummarizer,
    publisher: Arc<dyn ResultPublisher>,
    files: Arc<dyn StateFiles>,
    callback: String,
    processed_file: String,
    cache_file: String,
    processed_cap: usize,
}

impl Pipeline {
    pub fn new(
        cfg: &PipelineConfig,
        fetcher: Box<dyn ArticleFetcher>,
        oracle: DynOracle,
        publisher: Arc<dyn ResultPublisher>,
        files: Arc<dyn StateFiles>,
    ) -> Self {
        let grouper = ArticleGrouper::new(oracle.clone())
            .with_skip_threshold(cfg.oracle_skip_threshold)
            .with_snippet_chars(cfg.snippet_chars);
        Self {
            fetcher,
            grouper,
            summarizer: ArticleSummarizer::new(oracle),
            publisher,
            files,
            callback: cfg.callback.clone(),
            processed_file: cfg.processed_file.clone(),
            cache_file: cfg.cache_file.clone(),
            processed_cap: cfg.processed_cap,
        }
    }

    pub async fn run_once(&self) -> RunReport {
        ingest::ensure_metrics_described();
        ingest::record_run_ts();
        info!("Starting news digest run");

        let batch = ingest::fetch_batch(self.fetcher.as_ref(), &self.callback).await;
        let mut report = RunReport {
            fetched: batch.articles.len(),
            ..RunReport::default()
        };
        info!(
            articles = batch.articles.len(),
            pre_grouped = batch.pre_grouped.len(),
            without_event = batch.remaining.len(),
            "Processing fetched articles"
        );
        if batch.is_empty() {
            return report.reply(REPLY_NO_ARTICLES);
        }

        let mut processed =
            ProcessedSet::load(self.files.as_ref(), &self.processed_file, self.processed_cap);
        let mut cache = ArticleCache::load(self.files.as_ref(), &self.cache_file);
        info!(already_processed = processed.len(), cached = cache.len(), "loaded dedup state");

        let new_articles: Vec<Article> = batch
            .articles
            .iter()
            .filter(|a| processed.is_new(a))
            .cloned()
            .collect();
        let pre_grouped: Vec<Cluster> = batch
            .pre_grouped
            .into_iter()
            .map(|g| {
                g.into_iter()
                    .filter(|a| processed.is_new(a))
                    .collect::<Cluster>()
            })
            .filter(|g| g.len() >= MIN_CLUSTER_SIZE)
            .collect();

        report.new_articles = new_articles.len();
        counter!("newswire_articles_new_total").increment(new_articles.len() as u64);
        info!(new = new_articles.len(), "Found new articles");
        if new_articles.is_empty() {
            return report.reply(REPLY_NOTHING_NEW);
        }

        let clusters = self.grouper.group(&new_articles, pre_grouped).await;
        report.clusters = clusters.len();
        info!(groups = clusters.len(), "Grouped articles");

        for cluster in clusters.iter().filter(|c| c.len() >= MIN_CLUSTER_SIZE) {
            let artifact = self.summarizer.summarize(cluster).await;
            for article in cluster {
                processed.record_processed(article);
                cache.cache_article(article, &artifact.summary);
            }
            report.results.push(artifact);
        }
        cache.retain_processed(&processed);

        if let Err(e) = self.save_state(&processed, &cache) {
            warn!(error = ?e, "failed to persist processed state");
        }

        if report.results.is_empty() {
            return report.reply(REPLY_NO_GROUPS);
        }

        info!(results = report.results.len(), "Sending results to API");
        let payload = NewsPayload::now(report.results.clone());
        match self.publisher.publish(&payload).await {
            Ok(()) => report.published = true,
            Err(e) => {
                counter!("newswire_publish_errors_total").increment(1);
                warn!(error = ?e, publisher = self.publisher.name(), "Error sending to API");
            }
        }

        let summary_lines = group_replies(&report.results);
        report.replies.push(format!(
            "Processed {} article groups with similar content.",
            report.results.len()
        ));
        report.replies.extend(summary_lines);
        info!("news digest run finished");
        report
    }

    fn save_state(&self, processed: &ProcessedSet, cache: &ArticleCache) -> Result<()> {
        processed.save(self.files.as_ref(), &self.processed_file)?;
        cache.save(self.files.as_ref(), &self.cache_file)?;
        Ok(())
    }
}

/// Per-group operator lines; summaries are cut to 150 characters.
pub fn group_replies(results: &[SummaryArtifact]) -> Vec<String> {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let short: String = r.summary.chars().take(150).collect();
            format!(
                "Group {}:\n- Summary: {}...\n- Sentiment: {}\n- Trading recommendations: {} buy, {} sell",
                i + 1,
                short,
                r.sentiment.as_str(),
                r.trading_recommendations.buy.len(),
                r.trading_recommendations.sell.len()
            )
        })
        .collect()
}
