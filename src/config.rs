use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const ENV_FILE: &str = ".env";
const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Configuration shipped with the binary.
pub const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub openrouter: OpenRouterConfig,
    pub search: SearchConfig,
    pub ranking: RankingConfig,
    pub whitelist: WhitelistConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenRouterConfig {
    pub base_url: String,
    pub planner_model: String,
    pub search_model: String,
    pub decider_model: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Total attempts for one structured LLM response, including the first.
    #[serde(default = "default_parse_attempts")]
    pub max_parse_attempts: u32,
}

fn default_request_timeout() -> u64 { 120_000 }
fn default_parse_attempts() -> u32 { 2 }

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_planned_queries")]
    pub max_planned_queries: usize,
    #[serde(default = "default_followup_queries")]
    pub max_followup_queries: usize,
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,
    #[serde(default = "default_preview_size")]
    pub preview_size: usize,
    #[serde(default)]
    pub confirm_packs: Vec<ConfirmPack>,
}

fn default_planned_queries() -> usize { 3 }
fn default_followup_queries() -> usize { 6 }
fn default_results_per_query() -> usize { 8 }
fn default_preview_size() -> usize { 6 }

/// Extra queries appended to every deepen cycle. When `topic_contains` is
/// set the pack only applies to topics containing that keyword.
#[derive(Debug, Deserialize, Clone)]
pub struct ConfirmPack {
    #[serde(default)]
    pub topic_contains: Option<String>,
    pub queries: Vec<String>,
}

impl ConfirmPack {
    pub fn applies_to(&self, topic: &str) -> bool {
        match &self.topic_contains {
            Some(keyword) => topic.to_lowercase().contains(&keyword.to_lowercase()),
            None => true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RankingConfig {
    #[serde(default)]
    pub high_tier: Vec<String>,
    #[serde(default)]
    pub medium_tier: Vec<String>,
    #[serde(default)]
    pub domain_weights: BTreeMap<String, f64>,
    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,
    #[serde(default = "default_half_life")]
    pub recency_half_life_hours: f64,
    #[serde(default = "default_newsletter_cap")]
    pub newsletter_cap: usize,
    /// Evergreen items (listicles, stale best-picks) kept after ranking.
    #[serde(default = "default_evergreen_cap")]
    pub evergreen_cap: usize,
}

fn default_recency_weight() -> f64 { 0.8 }
fn default_half_life() -> f64 { 24.0 }
fn default_newsletter_cap() -> usize { 1 }
fn default_evergreen_cap() -> usize { 1 }

#[derive(Debug, Deserialize, Clone)]
pub struct WhitelistConfig {
    /// Domains trusted for topics without their own entry.
    #[serde(default)]
    pub default: Vec<String>,
    #[serde(default)]
    pub topics: BTreeMap<String, Vec<String>>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG).context("embedded default config is invalid")
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.openrouter.max_parse_attempts == 0 {
            anyhow::bail!("openrouter.max_parse_attempts must be at least 1");
        }
        if self.search.max_planned_queries == 0 {
            anyhow::bail!("search.max_planned_queries must be at least 1");
        }
        if self.search.max_followup_queries == 0 {
            anyhow::bail!("search.max_followup_queries must be at least 1");
        }
        if self.search.results_per_query == 0 {
            anyhow::bail!("search.results_per_query must be at least 1");
        }
        if self.ranking.recency_half_life_hours <= 0.0 {
            anyhow::bail!("ranking.recency_half_life_hours must be positive");
        }
        Ok(())
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for (key, value) in parse_env_lines(content) {
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// The OpenRouter key comes from the environment (or .env). A missing key
    /// is a startup error.
    pub fn openrouter_api_key() -> Result<String> {
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !sanitize_key(&key).is_empty() => Ok(sanitize_key(&key)),
            _ => anyhow::bail!(
                "{} is not set; export it or add it to {}",
                API_KEY_VAR,
                ENV_FILE
            ),
        }
    }
}

fn parse_env_lines(content: &str) -> Vec<(&str, &str)> {
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let key = key.trim().trim_start_matches("export ").trim();
            (key, value.trim().trim_matches('"').trim_matches('\''))
        })
        .collect()
}

/// Strip carriage returns, BOM, and other invisible chars from a key value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_parses() {
        let config = Config::embedded().unwrap();
        assert_eq!(config.search.max_planned_queries, 3);
        assert_eq!(config.search.results_per_query, 8);
        assert_eq!(config.openrouter.max_parse_attempts, 2);
        assert!(config.ranking.high_tier.iter().any(|d| d == "reuters.com"));
        assert!(config.whitelist.topics.contains_key("ai advancements"));
        assert_eq!(config.ranking.domain_weights.get("reuters.com"), Some(&1.0));
        assert_eq!(config.ranking.newsletter_cap, 1);
        assert_eq!(config.ranking.evergreen_cap, 1);
    }

    #[test]
    fn test_confirm_pack_topic_gate() {
        let config = Config::embedded().unwrap();
        let polish: Vec<_> = config
            .search
            .confirm_packs
            .iter()
            .filter(|p| p.applies_to("Stock Market - Polish"))
            .collect();
        let generic: Vec<_> = config
            .search
            .confirm_packs
            .iter()
            .filter(|p| p.applies_to("ai news"))
            .collect();
        assert_eq!(polish.len(), 2);
        assert_eq!(generic.len(), 1);
    }

    #[test]
    fn test_missing_sections_rejected() {
        assert!(Config::parse("[openrouter]\nbase_url = \"x\"").is_err());
    }

    #[test]
    fn test_zero_parse_attempts_rejected() {
        let content = DEFAULT_CONFIG.replace("max_parse_attempts = 2", "max_parse_attempts = 0");
        let err = Config::parse(&content).unwrap_err();
        assert!(err.to_string().contains("max_parse_attempts"));
    }

    #[test]
    fn test_zero_search_caps_rejected() {
        let content = DEFAULT_CONFIG.replace("max_followup_queries = 6", "max_followup_queries = 0");
        let err = Config::parse(&content).unwrap_err();
        assert!(err.to_string().contains("max_followup_queries"));

        let content = DEFAULT_CONFIG.replace("results_per_query = 8", "results_per_query = 0");
        let err = Config::parse(&content).unwrap_err();
        assert!(err.to_string().contains("results_per_query"));
    }

    #[test]
    fn test_env_lines() {
        let parsed = parse_env_lines("# comment\nexport OPENROUTER_API_KEY=\"sk-1\"\r\n\nBAD LINE\nA='b'\n");
        assert_eq!(parsed, vec![("OPENROUTER_API_KEY", "sk-1"), ("A", "b")]);
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("\u{feff} sk-or-123\r\n"), "sk-or-123");
    }
}
