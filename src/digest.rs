// src/digest.rs
//! Wire types for one summarized cluster and for the batch posted to the collector.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl From<String> for Sentiment {
    /// Anything unrecognized reads as neutral.
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingRecommendation {
    pub symbol: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingRecommendations {
    #[serde(default)]
    pub buy: Vec<TradingRecommendation>,
    #[serde(default)]
    pub sell: Vec<TradingRecommendation>,
}

/// Summary, sentiment and trade ideas for one cluster. Also the collector's
/// `ArticleGroup` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryArtifact {
    pub summary: String,
    pub sentiment: Sentiment,
    pub sentiment_explanation: String,
    pub trading_recommendations: TradingRecommendations,
    pub sources: Vec<String>,
    pub original_titles: Vec<String>,
    #[serde(default)]
    pub original_sources: Option<Vec<String>>,
}

/// Body the pipeline posts to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsPayload {
    pub timestamp: String,
    pub article_groups: Vec<SummaryArtifact>,
}

impl NewsPayload {
    /// Stamped with the current UTC time (ISO-8601, no offset suffix).
    pub fn now(article_groups: Vec<SummaryArtifact>) -> Self {
        Self {
            timestamp: chrono::Utc::now()
                .naive_utc()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            article_groups,
        }
    }
}

/// One group as the collector stores it. Unlike `SummaryArtifact`, the
/// sentiment is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleGroup {
    pub summary: String,
    pub sentiment: String,
    pub sentiment_explanation: String,
    pub trading_recommendations: TradingRecommendations,
    pub sources: Vec<String>,
    pub original_titles: Vec<String>,
    #[serde(default)]
    pub original_sources: Option<Vec<String>>,
}

/// Body of `POST /api/news` on the collector side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedNews {
    pub timestamp: String,
    pub article_groups: Vec<ArticleGroup>,
}
