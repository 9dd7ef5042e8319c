// tests/ingest_fixture.rs
//
// Fetch + unwrap + partition over canned aggregation responses.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use newswire_digest::ingest::fetch_batch;
use newswire_digest::ingest::providers::FixtureFetcher;
use newswire_digest::ingest::types::ArticleFetcher;

const CALLBACK: &str = "JSON_CALLBACK";

struct Unreachable;

#[async_trait]
impl ArticleFetcher for Unreachable {
    async fn fetch_raw(&self) -> Result<String> {
        Err(anyhow!("dns failure"))
    }
    fn name(&self) -> &'static str {
        "unreachable"
    }
}

fn uris(articles: &[newswire_digest::Article]) -> Vec<String> {
    articles.iter().map(|a| a.identity()).collect()
}

#[tokio::test]
async fn sample_payload_has_no_event_groups() {
    let f = FixtureFetcher::from_fixture(include_str!("fixtures/sample_articles.json"));
    let batch = fetch_batch(&f, CALLBACK).await;

    assert_eq!(batch.articles.len(), 4);
    // JSON null, the "null" literal and a missing field all mean "no event"
    assert!(batch.pre_grouped.is_empty());
    assert_eq!(uris(&batch.remaining), vec!["article1", "article2", "article3", "article4"]);
    assert_eq!(batch.articles[0].source_title(), "CNBC");
}

#[tokio::test]
async fn stream_payload_is_partitioned_by_event() {
    let f = FixtureFetcher::from_fixture(include_str!("fixtures/minute_stream.json"));
    let batch = fetch_batch(&f, CALLBACK).await;

    assert_eq!(batch.articles.len(), 7, "entry without body/uri is dropped");
    assert_eq!(batch.pre_grouped.len(), 1, "single-member event is not a group");
    assert_eq!(uris(&batch.pre_grouped[0]), vec!["ev-a", "ev-b"]);
    assert_eq!(
        uris(&batch.remaining),
        vec!["t1", "t2", "r1", "r2"]
    );
    let r1 = batch.articles.iter().find(|a| a.identity() == "r1").unwrap();
    assert_eq!(r1.source_title(), "Unknown");
}

#[tokio::test]
async fn unwrapped_json_is_accepted() {
    let f = FixtureFetcher::from_fixture(
        r#"{"recentActivityArticles": {"activity": [{"uri": "u", "title": "t", "body": "b"}]}}"#,
    );
    let batch = fetch_batch(&f, CALLBACK).await;
    assert_eq!(batch.articles.len(), 1);
}

#[tokio::test]
async fn transport_and_parse_errors_yield_empty_batches() {
    assert!(fetch_batch(&Unreachable, CALLBACK).await.is_empty());

    let f = FixtureFetcher::from_fixture("JSON_CALLBACK(<html>rate limited</html>)");
    assert!(fetch_batch(&f, CALLBACK).await.is_empty());
}
