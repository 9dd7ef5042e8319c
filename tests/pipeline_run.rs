// tests/pipeline_run.rs
//
// Full runs over the fixture payload with in-memory state, a scripted oracle
// and an in-memory publisher.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use newswire_digest::analyze::ai_adapter::ScriptedOracle;
use newswire_digest::analyze::grouping::GROUPING_PROMPT_MARKER;
use newswire_digest::analyze::summarize::SUMMARY_PROMPT_MARKER;
use newswire_digest::cache::{ArticleCache, ProcessedSet, LEGACY_CACHE_FILE, PROCESSED_FILE};
use newswire_digest::config::PipelineConfig;
use newswire_digest::digest::{NewsPayload, Sentiment};
use newswire_digest::ingest::providers::FixtureFetcher;
use newswire_digest::ingest::types::ArticleFetcher;
use newswire_digest::notify::{MemoryPublisher, ResultPublisher};
use newswire_digest::pipeline::{REPLY_NOTHING_NEW, REPLY_NO_ARTICLES, REPLY_NO_GROUPS};
use newswire_digest::store::MemoryFiles;
use newswire_digest::Pipeline;

const STREAM: &str = include_str!("fixtures/minute_stream.json");

const ARTIFACT: &str = r#"Sure! {"summary": "Markets digest.", "sentiment": "negative",
 "sentiment_explanation": "Rates up.",
 "trading_recommendations": {"buy": [], "sell": [{"symbol": "XLF", "reason": "Margins"}]},
 "sources": ["Reuters", "AP"]}"#;

fn scripted() -> Arc<ScriptedOracle> {
    Arc::new(
        ScriptedOracle::new("nothing useful")
            .with_rule(GROUPING_PROMPT_MARKER, "[[0, 2]]")
            .with_rule(SUMMARY_PROMPT_MARKER, ARTIFACT),
    )
}

struct FailingFetcher;

#[async_trait]
impl ArticleFetcher for FailingFetcher {
    async fn fetch_raw(&self) -> Result<String> {
        Err(anyhow!("connection refused"))
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

struct FailingPublisher;

#[async_trait]
impl ResultPublisher for FailingPublisher {
    async fn publish(&self, _payload: &NewsPayload) -> Result<()> {
        Err(anyhow!("collector down"))
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

fn pipeline(
    oracle: Arc<ScriptedOracle>,
    publisher: Arc<dyn ResultPublisher>,
    files: Arc<MemoryFiles>,
) -> Pipeline {
    Pipeline::new(
        &PipelineConfig::default(),
        Box::new(FixtureFetcher::from_fixture(STREAM)),
        oracle,
        publisher,
        files,
    )
}

#[tokio::test]
async fn full_run_groups_summarizes_persists_and_publishes() {
    let oracle = scripted();
    let publisher = Arc::new(MemoryPublisher::new());
    let files = Arc::new(MemoryFiles::new());

    let report = pipeline(oracle.clone(), publisher.clone(), files.clone())
        .run_once()
        .await;

    // 7 valid (one entry lacks body/uri); event group + title group + oracle group
    assert_eq!(report.fetched, 7);
    assert_eq!(report.new_articles, 7);
    assert_eq!(report.results.len(), 3);
    assert!(report.published);
    // one grouping call + one summary call per cluster
    assert_eq!(oracle.call_count(), 4);

    let sent = publisher.sent();
    assert_eq!(sent.len(), 1);
    let groups = &sent[0].article_groups;
    assert_eq!(
        groups[0].original_titles,
        vec![
            "Chipmaker unveils new AI accelerator",
            "New accelerator from chipmaker targets AI training"
        ]
    );
    assert_eq!(groups[1].original_sources, Some(vec!["Reuters".to_string(), "AP".to_string()]));
    // residual list was [solo-event, r1, r2]; oracle paired ids 0 and 2
    assert_eq!(
        groups[2].original_titles,
        vec!["Airline reports record quarterly revenue", "Oil"]
    );
    assert_eq!(groups[2].sentiment, Sentiment::Negative);

    let processed = ProcessedSet::load(files.as_ref(), PROCESSED_FILE, 1000);
    assert_eq!(processed.len(), 6);
    assert!(!processed.contains("r1"), "unclustered article must stay unprocessed");
    let cache = ArticleCache::load(files.as_ref(), LEGACY_CACHE_FILE);
    assert_eq!(cache.articles["t1"].summary, "Markets digest.");

    assert_eq!(report.replies[0], "Processed 3 article groups with similar content.");
    assert_eq!(report.replies.len(), 4);
}

#[tokio::test]
async fn second_run_skips_everything_already_summarized() {
    let files = Arc::new(MemoryFiles::new());
    let publisher = Arc::new(MemoryPublisher::new());
    pipeline(scripted(), publisher.clone(), files.clone())
        .run_once()
        .await;

    let oracle = scripted();
    let report = pipeline(oracle.clone(), publisher.clone(), files.clone())
        .run_once()
        .await;

    // only r1 is left; a lone article never reaches the oracle
    assert_eq!(report.new_articles, 1);
    assert!(report.results.is_empty());
    assert_eq!(oracle.call_count(), 0);
    assert_eq!(report.replies, vec![REPLY_NO_GROUPS.to_string()]);
    assert_eq!(publisher.sent().len(), 1, "nothing new published");
}

#[tokio::test]
async fn fetch_failure_ends_the_run_quietly() {
    let oracle = scripted();
    let publisher = Arc::new(MemoryPublisher::new());
    let files = Arc::new(MemoryFiles::new());
    let p = Pipeline::new(
        &PipelineConfig::default(),
        Box::new(FailingFetcher),
        oracle.clone(),
        publisher.clone(),
        files.clone(),
    );

    let report = p.run_once().await;

    assert_eq!(report.replies, vec![REPLY_NO_ARTICLES.to_string()]);
    assert_eq!(oracle.call_count(), 0);
    assert!(publisher.sent().is_empty());
    assert!(files.get(PROCESSED_FILE).is_none());
}

#[tokio::test]
async fn publish_failure_keeps_committed_state() {
    let files = Arc::new(MemoryFiles::new());
    let report = pipeline(scripted(), Arc::new(FailingPublisher), files.clone())
        .run_once()
        .await;

    assert!(!report.published);
    assert_eq!(report.results.len(), 3);
    let processed = ProcessedSet::load(files.as_ref(), PROCESSED_FILE, 1000);
    assert_eq!(processed.len(), 6);
}

#[tokio::test]
async fn unparsable_summaries_fall_back_to_neutral() {
    let oracle = Arc::new(ScriptedOracle::new("I'd rather not.").with_rule(GROUPING_PROMPT_MARKER, "[[0, 2]]"));
    let publisher = Arc::new(MemoryPublisher::new());
    let report = pipeline(oracle, publisher.clone(), Arc::new(MemoryFiles::new()))
        .run_once()
        .await;

    assert_eq!(report.results.len(), 3);
    for r in &report.results {
        assert_eq!(r.sentiment, Sentiment::Neutral);
        assert_eq!(r.summary, "Failed to generate summary.");
        assert!(r.trading_recommendations.buy.is_empty());
    }
    assert!(report.published);
}

#[tokio::test]
async fn identities_evicted_from_processed_list_are_new_again() {
    let files = Arc::new(MemoryFiles::new());

    // Everything in the fixture was summarized long ago: still in the legacy
    // cache, but pushed out of the processed list by 1500 later articles.
    let mut cache = ArticleCache::default();
    let mut processed = ProcessedSet::with_capacity(1000);
    for uri in ["ev-a", "ev-b", "solo-event", "t1", "t2", "r1", "r2"] {
        let a = newswire_digest::Article {
            uri: Some(uri.to_string()),
            ..Default::default()
        };
        cache.cache_article(&a, "old");
        processed.record_processed(&a);
    }
    for i in 0..1500 {
        let a = newswire_digest::Article {
            uri: Some(format!("later-{i}")),
            ..Default::default()
        };
        cache.cache_article(&a, "");
        processed.record_processed(&a);
    }
    assert!(!processed.contains("t1"));
    processed.save(files.as_ref(), PROCESSED_FILE).unwrap();
    cache.save(files.as_ref(), LEGACY_CACHE_FILE).unwrap();

    let oracle = scripted();
    let report = pipeline(oracle.clone(), Arc::new(MemoryPublisher::new()), files.clone())
        .run_once()
        .await;

    assert_eq!(report.new_articles, 7);
    assert_eq!(report.results.len(), 3);
    assert_ne!(report.replies, vec![REPLY_NOTHING_NEW.to_string()]);

    // both persisted files respect the same bound
    let processed = ProcessedSet::load(files.as_ref(), PROCESSED_FILE, 1000);
    let cache = ArticleCache::load(files.as_ref(), LEGACY_CACHE_FILE);
    assert_eq!(processed.len(), 1000);
    assert!(cache.len() <= 1000);
    assert_eq!(cache.articles["t1"].summary, "Markets digest.");
    assert!(!cache.articles.contains_key("later-0"));
}

#[tokio::test]
async fn demo_oracle_pairs_the_sample_articles() {
    let publisher = Arc::new(MemoryPublisher::new());
    let p = Pipeline::new(
        &PipelineConfig::default(),
        Box::new(FixtureFetcher::from_fixture(include_str!("fixtures/sample_articles.json"))),
        Arc::new(ScriptedOracle::demo()),
        publisher.clone(),
        Arc::new(MemoryFiles::new()),
    );

    let report = p.run_once().await;

    assert_eq!(report.results.len(), 2);
    let titles: Vec<usize> = report.results.iter().map(|r| r.original_titles.len()).collect();
    assert_eq!(titles, vec![2, 2]);
    assert_eq!(
        report.results[1].original_sources,
        Some(vec!["Yahoo".to_string(), "Local News".to_string()])
    );
    assert_eq!(publisher.sent().len(), 1);
}
