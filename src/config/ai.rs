// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    1500
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_connect_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// "openai" | "mock" (case-insensitive)
    pub provider: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Chat-completions compatible base URL (no trailing `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "openai".to_string(),
            api_key: "ENV".to_string(),
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Falls back to defaults when the file is absent; malformed files are errors.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(data: &str) -> anyhow::Result<Self> {
        let mut cfg: AiConfig = serde_json::from_str(data)?;

        // Normalize provider
        cfg.provider = cfg.provider.trim().to_lowercase();

        // Resolve api key if "ENV"
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "openai" if cfg.enabled => env::var("OPENAI_API_KEY")
                    .map_err(|_| anyhow::anyhow!("Missing OPENAI_API_KEY env var"))?,
                "openai" | "mock" => String::new(),
                other => anyhow::bail!("Unsupported provider in config: {other}"),
            };
        }

        if !(0.0..=2.0).contains(&cfg.temperature) {
            cfg.temperature = default_temperature();
        }
        cfg.base_url = cfg.base_url.trim_end_matches('/').to_string();

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let cfg = AiConfig::from_json(r#"{"enabled": false, "provider": " OpenAI ", "api_key": "ENV"}"#)
            .unwrap();
        assert_eq!(cfg.provider, "openai");
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.max_tokens, 1500);
        assert_eq!(cfg.connect_timeout_secs, 5);
        assert!(cfg.api_key.is_empty());
    }

    #[test]
    fn timeouts_are_configurable() {
        let cfg = AiConfig::from_json(
            r#"{"enabled": false, "provider": "mock", "timeout_secs": 90, "connect_timeout_secs": 2}"#,
        )
        .unwrap();
        assert_eq!(cfg.timeout_secs, 90);
        assert_eq!(cfg.connect_timeout_secs, 2);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = AiConfig::from_json(r#"{"enabled": true, "provider": "llama", "api_key": "env"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn out_of_range_temperature_and_trailing_slash_are_sanitized() {
        let cfg = AiConfig::from_json(
            r#"{"enabled": false, "provider": "mock", "api_key": "k", "temperature": 9.0,
                "base_url": "http://localhost:1234/v1/"}"#,
        )
        .unwrap();
        assert_eq!(cfg.temperature, 0.2);
        assert_eq!(cfg.base_url, "http://localhost:1234/v1");
        assert_eq!(cfg.api_key, "k");
    }
}
