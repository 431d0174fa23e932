// src/ingest/config.rs
//! Feed source configuration (`config/rss_sources.json` or `.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DigestError;
use crate::ingest::providers::rss::DEFAULT_MAX_ITEMS;
use crate::types::Ruleset;

pub const ENV_PATH: &str = "RSS_SOURCES_PATH";
pub const DEFAULT_JSON_PATH: &str = "config/rss_sources.json";
pub const DEFAULT_TOML_PATH: &str = "config/rss_sources.toml";

fn default_true() -> bool {
    true
}
fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
}

impl SourceConfig {
    pub fn ruleset(&self) -> Ruleset {
        Ruleset::new(self.keywords.clone(), self.exclude_keywords.clone())
    }
}

/// Upper bound for `recent_hours`: one leap year.
pub const MAX_RECENT_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    pub max_daily_items: usize,
    pub recent_hours: i64,
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    pub priority_keywords: Vec<String>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            max_daily_items: 50,
            recent_hours: 24,
            request_delay_ms: 1000,
            timeout_secs: 30,
            priority_keywords: vec!["AI".into(), "人工智能".into(), "ChatGPT".into()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub global_settings: GlobalSettings,
}

impl SourcesConfig {
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    /// `(name, ruleset)` pairs of enabled sources, in config order.
    pub fn rulesets(&self) -> Vec<(String, Ruleset)> {
        self.enabled_sources()
            .map(|s| (s.name.clone(), s.ruleset()))
            .collect()
    }
}

/// Load from an explicit path; the extension picks the format, JSON otherwise.
pub fn load_sources_from(path: &Path) -> Result<SourcesConfig, DigestError> {
    let content = fs::read_to_string(path).map_err(|e| DigestError::config(path, e))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str()).map_err(|e| DigestError::config(path, e))
}

/// Resolve the config path:
/// 1) $RSS_SOURCES_PATH
/// 2) config/rss_sources.json
/// 3) config/rss_sources.toml
pub fn load_sources_default() -> Result<SourcesConfig, DigestError> {
    load_sources_from(&default_path())
}

pub fn default_path() -> PathBuf {
    if let Ok(p) = std::env::var(ENV_PATH) {
        return PathBuf::from(p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return json_p;
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return toml_p;
    }
    json_p
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<SourcesConfig, DigestError> {
    let cfg: SourcesConfig = if hint_ext == "toml" {
        toml::from_str(s)?
    } else {
        serde_json::from_str(s)?
    };
    clean(cfg)
}

fn clean(mut cfg: SourcesConfig) -> Result<SourcesConfig, DigestError> {
    let hours = cfg.global_settings.recent_hours;
    if !(1..=MAX_RECENT_HOURS).contains(&hours) {
        return Err(DigestError::Validation(format!(
            "recent_hours must be between 1 and {MAX_RECENT_HOURS}, got {hours}"
        )));
    }
    for src in cfg.sources.iter_mut() {
        src.name = src.name.trim().to_string();
        src.url = src.url.trim().to_string();
        if src.name.is_empty() {
            return Err(DigestError::Validation("source with empty name".into()));
        }
        if src.url.is_empty() {
            return Err(DigestError::Validation(format!(
                "source {:?} has an empty url",
                src.name
            )));
        }
    }
    Ok(cfg)
}
