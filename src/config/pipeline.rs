// src/config/pipeline.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "NEWSWIRE_CONFIG_PATH";
pub const DEFAULT_PIPELINE_CONFIG_PATH: &str = "config/pipeline.toml";
const ENV_API_ENDPOINT: &str = "API_ENDPOINT";
const ENV_EVENT_REGISTRY_KEY: &str = "EVENT_REGISTRY_API_KEY";

/// US business/government/computing coverage from top-decile sources, English only.
pub const DEFAULT_QUERY: &str = r#"{"$query":{"$and":[{"$or":[{"categoryUri":"dmoz/Business"},{"categoryUri":"dmoz/Society/Government"},{"categoryUri":"dmoz/Computers"}]},{"locationUri":"http://en.wikipedia.org/wiki/United_States"},{"lang":"eng"}]},"$filter":{"startSourceRankPercentile":0,"endSourceRankPercentile":10}}"#;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub fetch_url: String,
    pub query: String,
    /// "ENV" means: read from EVENT_REGISTRY_API_KEY
    pub api_key: String,
    pub lookback_mins: u32,
    pub callback: String,
    pub collector_endpoint: String,
    pub state_dir: PathBuf,
    pub processed_file: String,
    pub cache_file: String,
    pub processed_cap: usize,
    /// Cluster count at which the LLM grouping stage is skipped.
    pub oracle_skip_threshold: usize,
    pub snippet_chars: usize,
    pub http_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_url: "https://eventregistry.org/api/v1/minuteStreamArticles".to_string(),
            query: DEFAULT_QUERY.to_string(),
            api_key: "ENV".to_string(),
            lookback_mins: 9000,
            callback: "JSON_CALLBACK".to_string(),
            collector_endpoint: "http://localhost:8000/api/news".to_string(),
            state_dir: PathBuf::from("."),
            processed_file: crate::cache::PROCESSED_FILE.to_string(),
            cache_file: crate::cache::LEGACY_CACHE_FILE.to_string(),
            processed_cap: crate::cache::DEFAULT_PROCESSED_CAP,
            oracle_skip_threshold: 3,
            snippet_chars: 500,
            http_timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

impl PipelineConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        let cfg: PipelineConfig = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg.apply_env())
    }

    /// Load using env var + fallbacks:
    /// 1) $NEWSWIRE_CONFIG_PATH
    /// 2) config/pipeline.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("NEWSWIRE_CONFIG_PATH points to non-existent path"));
            }
        }
        let toml_p = PathBuf::from(DEFAULT_PIPELINE_CONFIG_PATH);
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        Ok(Self::default().apply_env())
    }

    fn apply_env(mut self) -> Self {
        if let Ok(ep) = std::env::var(ENV_API_ENDPOINT) {
            if !ep.trim().is_empty() {
                self.collector_endpoint = ep.trim().to_string();
            }
        }
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = std::env::var(ENV_EVENT_REGISTRY_KEY).unwrap_or_default();
        }
        if self.processed_cap == 0 {
            self.processed_cap = crate::cache::DEFAULT_PROCESSED_CAP;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: PipelineConfig = toml::from_str(
            r#"
lookback_mins = 60
oracle_skip_threshold = 5
"#,
        )
        .unwrap();
        assert_eq!(cfg.lookback_mins, 60);
        assert_eq!(cfg.oracle_skip_threshold, 5);
        assert_eq!(cfg.callback, "JSON_CALLBACK");
        assert_eq!(cfg.processed_cap, 1000);
        assert_eq!(cfg.snippet_chars, 500);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_API_ENDPOINT);

        // No files in temp CWD → defaults
        let d = PipelineConfig::load_default().unwrap();
        assert_eq!(d.collector_endpoint, "http://localhost:8000/api/news");

        // Fallback TOML in ./config/
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(
            tmp.path().join(DEFAULT_PIPELINE_CONFIG_PATH),
            "processed_cap = 10\n",
        )
        .unwrap();
        assert_eq!(PipelineConfig::load_default().unwrap().processed_cap, 10);

        // Env path wins, API_ENDPOINT overrides the endpoint
        let p_env = tmp.path().join("other.toml");
        fs::write(&p_env, "processed_cap = 20\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
        env::set_var(ENV_API_ENDPOINT, "http://collector.test/api/news");
        let e = PipelineConfig::load_default().unwrap();
        assert_eq!(e.processed_cap, 20);
        assert_eq!(e.collector_endpoint, "http://collector.test/api/news");

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
        assert!(PipelineConfig::load_default().is_err());

        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_API_ENDPOINT);
        env::set_current_dir(&old).unwrap();
    }
}
