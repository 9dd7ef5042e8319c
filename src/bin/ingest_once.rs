//! Runs the digest pipeline once against the live aggregation API, the
//! configured oracle and the collector endpoint, then prints the report.

use std::sync::Arc;

use anyhow::Result;
use newswire_digest::analyze::build_oracle;
use newswire_digest::config::{ai::DEFAULT_AI_CONFIG_PATH, AiConfig, PipelineConfig};
use newswire_digest::ingest::providers::EventRegistryFetcher;
use newswire_digest::notify::CollectorPublisher;
use newswire_digest::store::DirFiles;
use newswire_digest::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    newswire_digest::init_tracing();

    let cfg = PipelineConfig::load_default()?;
    let ai_cfg = AiConfig::load_or_default(DEFAULT_AI_CONFIG_PATH)?;
    tracing::info!(
        "AI cfg loaded: provider={}, enabled={}, key_len={}",
        ai_cfg.provider,
        ai_cfg.enabled,
        ai_cfg.api_key.len()
    );

    let fetcher = EventRegistryFetcher::from_config(&cfg)?;
    let oracle = build_oracle(&ai_cfg)?;
    let publisher = CollectorPublisher::from_config(&cfg)?;
    let files = DirFiles::new(cfg.state_dir.clone());

    let pipeline = Pipeline::new(
        &cfg,
        Box::new(fetcher),
        oracle,
        Arc::new(publisher),
        Arc::new(files),
    );
    let report = pipeline.run_once().await;
    for line in &report.replies {
        println!("{line}");
    }
    Ok(())
}
