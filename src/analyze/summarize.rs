// src/analyze/summarize.rs
//! One oracle call per cluster → `SummaryArtifact`. Never fails: unusable
//! replies become a neutral fallback artifact.

use metrics::counter;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::analyze::ai_adapter::{ChatMessage, DynOracle};
use crate::analyze::extract::{self, ExtractError};
use crate::article::Article;
use crate::digest::{Sentiment, SummaryArtifact, TradingRecommendation, TradingRecommendations};

pub const SUMMARY_PROMPT_MARKER: &str = "Create a comprehensive summary";

const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a financial news analyst. You receive several articles about the same topic.

1. Write a brief, comprehensive, easy-to-understand summary that captures all key information.
2. Classify the sentiment of the news as positive, negative, or neutral.
3. Give specific trading recommendations:
   - stocks likely to benefit (BUY)
   - stocks likely to suffer (SELL)
   - why each stock would be affected

Respond with JSON in exactly this structure:
{
  "summary": "Comprehensive summary...",
  "sentiment": "positive/negative/neutral",
  "sentiment_explanation": "Brief explanation of the sentiment...",
  "trading_recommendations": {
    "buy": [{"symbol": "TICKER", "reason": "Reason for buying"}],
    "sell": [{"symbol": "TICKER", "reason": "Reason for selling"}]
  },
  "sources": ["Source1", "Source2"]
}"#;

/// Shape accepted from the oracle. Only `summary` is mandatory; every other
/// field is read leniently so one odd value never costs the summary.
#[derive(Debug, Deserialize)]
struct OracleArtifact {
    summary: String,
    #[serde(default)]
    sentiment: Option<Value>,
    #[serde(default)]
    sentiment_explanation: Option<Value>,
    #[serde(default)]
    trading_recommendations: Option<Value>,
    #[serde(default)]
    sources: Option<Value>,
}

/// `null`, non-string and unknown values read as neutral.
fn lenient_sentiment(v: Option<&Value>) -> Sentiment {
    v.and_then(Value::as_str)
        .map(|s| Sentiment::from(s.to_string()))
        .unwrap_or_default()
}

/// Keeps every buy/sell entry that has a string `symbol`; drops the rest.
fn lenient_recommendations(v: Option<&Value>) -> TradingRecommendations {
    let side = |key: &str| -> Vec<TradingRecommendation> {
        v.and_then(|recs| recs.get(key))
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| {
                        let rec = TradingRecommendation::deserialize(e).ok();
                        if rec.is_none() {
                            debug!(entry = %e, "skipping malformed recommendation");
                        }
                        rec
                    })
                    .collect()
            })
            .unwrap_or_default()
    };
    TradingRecommendations {
        buy: side("buy"),
        sell: side("sell"),
    }
}

fn string_list(v: Option<&Value>) -> Option<Vec<String>> {
    v.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(|i| i.as_str().map(str::to_string))
            .collect()
    })
}

pub fn summary_messages(cluster: &[Article]) -> Vec<ChatMessage> {
    let titles_text = cluster
        .iter()
        .enumerate()
        .map(|(i, a)| format!("{}. {}", i + 1, a.title))
        .collect::<Vec<_>>()
        .join("\n");
    let bodies_text = cluster
        .iter()
        .enumerate()
        .map(|(i, a)| format!("SOURCE {} ({}):\n{}", i + 1, a.source_title(), a.body))
        .collect::<Vec<_>>()
        .join("\n\n");

    let user = format!(
        "TITLES:\n{titles_text}\n\nARTICLES:\n{bodies_text}\n\n\
         {SUMMARY_PROMPT_MARKER}, sentiment analysis, and trading recommendations based on these articles.\n\
         Return ONLY a JSON object with the structure specified in the instructions."
    );
    vec![ChatMessage::system(SUMMARY_SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// Parse an oracle reply for `cluster`. Titles and publisher names always
/// come from the cluster itself.
pub fn parse_artifact(reply: &str, cluster: &[Article]) -> Result<SummaryArtifact, ExtractError> {
    let raw: OracleArtifact = extract::object(reply)?;
    let (titles, sources) = titles_and_sources(cluster);
    Ok(SummaryArtifact {
        summary: raw.summary,
        sentiment: lenient_sentiment(raw.sentiment.as_ref()),
        sentiment_explanation: raw
            .sentiment_explanation
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        trading_recommendations: lenient_recommendations(raw.trading_recommendations.as_ref()),
        sources: string_list(raw.sources.as_ref()).unwrap_or_else(|| sources.clone()),
        original_titles: titles,
        original_sources: Some(sources),
    })
}

/// Neutral artifact with no recommendations.
pub fn fallback_artifact(cluster: &[Article], err: &ExtractError) -> SummaryArtifact {
    let (summary, explanation) = match err {
        ExtractError::NoJson => (
            "Failed to generate summary.",
            "Could not determine sentiment.",
        ),
        ExtractError::Parse(_) => (
            "Failed to generate summary due to error.",
            "Could not determine sentiment due to error.",
        ),
    };
    let (titles, sources) = titles_and_sources(cluster);
    SummaryArtifact {
        summary: summary.to_string(),
        sentiment: Sentiment::Neutral,
        sentiment_explanation: explanation.to_string(),
        trading_recommendations: TradingRecommendations::default(),
        sources: sources.clone(),
        original_titles: titles,
        original_sources: Some(sources),
    }
}

fn titles_and_sources(cluster: &[Article]) -> (Vec<String>, Vec<String>) {
    let titles = cluster.iter().map(|a| a.title.clone()).collect();
    let sources = cluster.iter().map(|a| a.source_title().to_string()).collect();
    (titles, sources)
}

pub struct ArticleSummarizer {
    oracle: DynOracle,
}

impl ArticleSummarizer {
    pub fn new(oracle: DynOracle) -> Self {
        Self { oracle }
    }

    pub async fn summarize(&self, cluster: &[Article]) -> SummaryArtifact {
        info!(size = cluster.len(), "Processing a group of similar articles");
        let messages = summary_messages(cluster);

        counter!("newswire_oracle_calls_total", "purpose" => "summary").increment(1);
        let reply = match self.oracle.complete(&messages).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = ?e, provider = self.oracle.provider_name(), "summary oracle call failed");
                return fallback_artifact(cluster, &ExtractError::Parse(e.to_string()));
            }
        };

        match parse_artifact(&reply, cluster) {
            Ok(artifact) => artifact,
            Err(e) => {
                counter!("newswire_oracle_parse_failures_total", "purpose" => "summary")
                    .increment(1);
                warn!(error = %e, "Could not parse AI summary, using fallback");
                fallback_artifact(cluster, &e)
            }
        }
    }
}
