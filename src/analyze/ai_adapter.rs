//! AI adapter: the language-model "oracle" behind one capability,
//! `complete(messages) -> text`. Callers never trust the text to be structured;
//! they extract JSON from it and fall back on failure.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ai::AiConfig;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Trait object used by the grouper, the summarizer and tests.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// One completion for an ordered list of messages. Single attempt.
    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynOracle = Arc<dyn Oracle>;

/// Factory: build an oracle according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns the scripted demo oracle.
/// * Else if `config.enabled==false`, returns a disabled oracle.
/// * Else builds the configured provider.
pub fn build_oracle(config: &AiConfig) -> anyhow::Result<DynOracle> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(ScriptedOracle::demo()));
    }

    if !config.enabled {
        return Ok(Arc::new(DisabledOracle));
    }

    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiOracle::new(config)?)),
        "mock" => Ok(Arc::new(ScriptedOracle::demo())),
        other => bail!("Unsupported AI provider: {other}"),
    }
}

// ------------------------------------------------------------
// Concrete providers
// ------------------------------------------------------------

/// OpenAI-compatible Chat Completions provider.
pub struct OpenAiOracle {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiOracle {
    pub fn new(config: &AiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("newswire-digest/0.1")
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs.max(1)))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("building oracle http client")?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        if self.api_key.is_empty() {
            bail!("missing API key for {}", self.provider_name());
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            #[serde(default)]
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let body: Resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("oracle request")?
            .error_for_status()
            .context("oracle non-2xx")?
            .json()
            .await
            .context("oracle response body")?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("oracle returned no choices"))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Always fails; used when AI is disabled. Oracle-dependent stages degrade
/// to their fallbacks.
pub struct DisabledOracle;

#[async_trait]
impl Oracle for DisabledOracle {
    async fn complete(&self, _messages: &[ChatMessage]) -> anyhow::Result<String> {
        Err(anyhow!("AI disabled"))
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Canned-response oracle that records every call.
///
/// The reply is chosen by the first rule whose needle occurs in the last
/// message; otherwise the default reply is returned.
pub struct ScriptedOracle {
    rules: Vec<(String, String)>,
    default_reply: String,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedOracle {
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            default_reply: default_reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rule(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((needle.into(), reply.into()));
        self
    }

    /// Pairs the first four residual articles and returns a fixed artifact.
    pub fn demo() -> Self {
        Self::new("Default mock response")
            .with_rule(crate::analyze::grouping::GROUPING_PROMPT_MARKER, "[[0, 1], [2, 3]]")
            .with_rule(crate::analyze::summarize::SUMMARY_PROMPT_MARKER, DEMO_ARTIFACT)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("oracle calls poisoned").len()
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().expect("oracle calls poisoned").clone()
    }
}

const DEMO_ARTIFACT: &str = r#"
{
  "summary": "Sample summary of the news articles.",
  "sentiment": "positive",
  "sentiment_explanation": "The articles present positive economic outlook.",
  "trading_recommendations": {
    "buy": [{"symbol": "AAPL", "reason": "Strong growth indicators"}],
    "sell": [{"symbol": "XYZ", "reason": "Potential downturn"}]
  },
  "sources": ["Source1", "Source2"]
}
"#;

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        self.calls
            .lock()
            .expect("oracle calls poisoned")
            .push(messages.to_vec());

        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| last.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_reply.clone());
        Ok(reply)
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
