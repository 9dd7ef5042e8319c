//! Offline run over four sample articles with the scripted oracle and
//! in-memory state. No network access.

use std::sync::Arc;

use newswire_digest::analyze::ScriptedOracle;
use newswire_digest::config::PipelineConfig;
use newswire_digest::ingest::providers::FixtureFetcher;
use newswire_digest::notify::MemoryPublisher;
use newswire_digest::store::MemoryFiles;
use newswire_digest::Pipeline;

const SAMPLE: &str = include_str!("../../tests/fixtures/sample_articles.json");

#[tokio::main]
async fn main() {
    newswire_digest::init_tracing();

    let cfg = PipelineConfig::default();
    let publisher = Arc::new(MemoryPublisher::new());
    let pipeline = Pipeline::new(
        &cfg,
        Box::new(FixtureFetcher::from_fixture(SAMPLE)),
        Arc::new(ScriptedOracle::demo()),
        publisher.clone(),
        Arc::new(MemoryFiles::new()),
    );

    let report = pipeline.run_once().await;
    for line in &report.replies {
        println!("{line}");
    }
    for payload in publisher.sent() {
        match serde_json::to_string_pretty(&payload) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("cannot render payload: {e}"),
        }
    }
    println!("demo done");
}
