use anyhow::{bail, ensure, Context};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::article::Category;

/// Largest batch the classifier prompt is designed for.
pub const MAX_BATCH_SIZE: usize = 20;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub sources: Vec<SourceConfig>,
}

/// One entry of the source registry.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    /// Two-letter language tag shown as a badge on each article
    pub lang: String,
}

/// Knobs for the selection pipeline: windowing, selection cap and retention.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of days, today included, whose archive files are kept
    pub retention_days: u32,
    pub max_articles: usize,
    /// The primary window covers today and this many days before it
    pub primary_window_days: u32,
    pub min_primary_articles: usize,
    /// Widened window used when the primary one is too sparse
    pub fallback_window_days: u32,
    pub max_items_per_source: usize,
    pub utc_offset_hours: i32,
    pub fallback_category: Category,
    pub archive_dir: PathBuf,
    pub output_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retention_days: 7,
            max_articles: 15,
            primary_window_days: 1,
            min_primary_articles: 5,
            fallback_window_days: 3,
            max_items_per_source: 30,
            utc_offset_hours: 9,
            fallback_category: Category::ProductsTools,
            archive_dir: PathBuf::from("data/articles"),
            output_path: PathBuf::from("site/index.html"),
        }
    }
}

impl PipelineConfig {
    /// Timezone that decides what "today" means for a run.
    pub fn timezone(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .with_context(|| format!("invalid utc_offset_hours: {}", self.utc_offset_hours))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub batch_size: usize,
    pub timeout_secs: u64,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com".to_string(),
            model: "claude-haiku-4-5-20251001".to_string(),
            max_tokens: 1024,
            batch_size: MAX_BATCH_SIZE,
            timeout_secs: 60,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            user_agent: format!("ai-topics/{} (News Digest)", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source registry {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("invalid source registry {}", path.display()))
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.sources.is_empty(), "source registry contains no sources");

        for (idx, source) in self.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                bail!("source #{} has an empty name", idx + 1);
            }
            if source.url.trim().is_empty() {
                bail!("source '{}' has an empty url", source.name);
            }
            if source.lang.len() != 2 || !source.lang.chars().all(|c| c.is_ascii_alphabetic()) {
                bail!(
                    "source '{}' has invalid lang '{}' (expected a two-letter code)",
                    source.name,
                    source.lang
                );
            }
        }

        let p = &self.pipeline;
        ensure!(p.retention_days > 0, "retention_days must be at least 1");
        ensure!(p.max_articles > 0, "max_articles must be at least 1");
        ensure!(
            p.max_items_per_source > 0,
            "max_items_per_source must be at least 1"
        );
        ensure!(
            p.fallback_window_days >= p.primary_window_days,
            "fallback_window_days ({}) must not be narrower than primary_window_days ({})",
            p.fallback_window_days,
            p.primary_window_days
        );
        ensure!(
            (-23..=23).contains(&p.utc_offset_hours),
            "utc_offset_hours must be within -23..=23"
        );
        ensure!(
            (1..=MAX_BATCH_SIZE).contains(&self.classifier.batch_size),
            "classifier batch_size must be within 1..={}",
            MAX_BATCH_SIZE
        );

        Ok(())
    }
}
