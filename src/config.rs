use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::core::scoring::{ComponentFloors, ScoringConfig, DEFAULT_SHORTLIST_THRESHOLD};
use crate::core::similarity::{SemanticEngine, SemanticOptions};
use crate::core::skills::{SkillAliases, PREFERRED_BONUS_CAP};
use crate::core::screener::{default_workers, Screener};
use crate::models::ScoringWeights;
use crate::services::{EmbeddingError, EmbeddingProvider, HashEmbedder, HttpEmbeddingProvider};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub skills: SkillSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default = "default_shortlist_threshold")]
    pub shortlist_threshold: u8,
    #[serde(default)]
    pub floors: ComponentFloors,
    #[serde(default = "default_preferred_bonus_cap")]
    pub preferred_bonus_cap: f64,
    #[serde(default = "default_true")]
    pub infer_missing_signals: bool,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            shortlist_threshold: default_shortlist_threshold(),
            floors: ComponentFloors::default(),
            preferred_bonus_cap: default_preferred_bonus_cap(),
            infer_missing_signals: true,
        }
    }
}

fn default_shortlist_threshold() -> u8 { DEFAULT_SHORTLIST_THRESHOLD }
fn default_preferred_bonus_cap() -> f64 { PREFERRED_BONUS_CAP }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSettings {
    /// Merge the builtin alias table under `aliases`
    #[serde(default = "default_true")]
    pub builtin_aliases: bool,
    /// alias -> canonical skill name
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Default for SkillSettings {
    fn default() -> Self {
        Self {
            builtin_aliases: true,
            aliases: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Hash,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            dimension: default_dimension(),
            endpoint: None,
            api_key: None,
            model: default_model(),
            timeout_ms: default_timeout_ms(),
            max_concurrent_calls: default_max_concurrent_calls(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_provider() -> ProviderKind { ProviderKind::Hash }
fn default_dimension() -> usize { 256 }
fn default_model() -> String { "all-MiniLM-L6-v2".to_string() }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_max_concurrent_calls() -> usize { 4 }
fn default_cache_capacity() -> u64 { 10_000 }
fn default_cache_ttl_secs() -> u64 { 3600 }

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Resumes evaluated concurrently; defaults to the CPU count
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SCREENER__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SCREENER__SCORING__SHORTLIST_THRESHOLD -> scoring.shortlist_threshold
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }

    pub fn scoring_config(&self) -> ScoringConfig {
        let s = &self.scoring;
        ScoringConfig {
            weights: s.weights,
            shortlist_threshold: s.shortlist_threshold,
            floors: s.floors,
            preferred_bonus_cap: s.preferred_bonus_cap,
            infer_missing_signals: s.infer_missing_signals,
        }
    }

    pub fn aliases(&self) -> SkillAliases {
        if self.skills.builtin_aliases {
            SkillAliases::with_overrides(self.skills.aliases.iter())
        } else {
            let mut aliases = SkillAliases::empty();
            for (alias, canonical) in &self.skills.aliases {
                aliases.insert(alias, canonical);
            }
            aliases
        }
    }

    pub fn build_provider(&self) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
        let e = &self.embedding;
        match e.provider {
            ProviderKind::Hash => Ok(Arc::new(HashEmbedder::new(e.dimension))),
            ProviderKind::Http => {
                let endpoint = e.endpoint.clone().ok_or_else(|| {
                    EmbeddingError::Rejected("embedding.endpoint is required for the http provider".to_string())
                })?;
                let provider = HttpEmbeddingProvider::new(
                    endpoint,
                    e.api_key.clone(),
                    e.model.clone(),
                    e.dimension,
                    Duration::from_millis(e.timeout_ms),
                )?;
                Ok(Arc::new(provider))
            }
        }
    }

    pub fn semantic_options(&self) -> SemanticOptions {
        let e = &self.embedding;
        SemanticOptions {
            max_concurrent_calls: e.max_concurrent_calls,
            call_timeout: Duration::from_millis(e.timeout_ms),
            cache_capacity: e.cache_capacity,
            cache_ttl_secs: e.cache_ttl_secs,
        }
    }

    /// Screener wired with the configured provider, aliases and worker count
    pub fn build_screener(&self) -> Result<Screener, EmbeddingError> {
        let engine = SemanticEngine::new(self.build_provider()?, self.semantic_options());
        let workers = self.batch.workers.unwrap_or_else(default_workers);
        Ok(Screener::new(engine, self.aliases(), workers))
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("SCREENER")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
