//! Configuration file handling.
//!
//! This module handles loading `.partnerminer.toml`, merging it with CLI
//! arguments, and freezing the result into a per-run [`AnalysisConfig`].
//! API keys are never read from the file.

use crate::cli::{Args, OutputFormat};
use crate::llm::GeminiConfig;
use crate::scraper::{ScraperProvider, SourceConfig};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".partnerminer.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scraping provider settings.
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Analysis inputs.
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report output path. Defaults to `<username>_report.<ext>`.
    #[serde(default)]
    pub output: Option<String>,
}

/// Scraping provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default)]
    pub provider: ScraperProvider,

    /// Provider API base URL.
    #[serde(default = "default_scraper_url")]
    pub base_url: String,

    /// Apify actor, `owner~name` form.
    #[serde(default = "default_actor")]
    pub actor: String,

    /// Request timeout in seconds. Actor runs are slow.
    #[serde(default = "default_scraper_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            provider: ScraperProvider::default(),
            base_url: default_scraper_url(),
            actor: default_actor(),
            timeout_seconds: default_scraper_timeout(),
        }
    }
}

fn default_scraper_url() -> String {
    "https://api.apify.com".to_string()
}

fn default_actor() -> String {
    "apify~instagram-profile-scraper".to_string()
}

fn default_scraper_timeout() -> u64 {
    300
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Default model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Gemini API base URL.
    #[serde(default = "default_model_url")]
    pub base_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            base_url: default_model_url(),
            temperature: default_temperature(),
            timeout_seconds: default_model_timeout(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_model_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_temperature() -> f32 {
    0.4
}

fn default_model_timeout() -> u64 {
    120
}

/// Analysis inputs that rarely change between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Path to the product / proposal guideline document.
    #[serde(default)]
    pub knowledge_base: Option<String>,
}

/// Everything one analysis run needs, resolved up front and passed down
/// explicitly.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub username: String,
    /// Reference instant for the recency window.
    pub now: DateTime<Utc>,
    pub source: SourceConfig,
    /// `None` with `--metrics-only`.
    pub gemini: Option<GeminiConfig>,
    /// Knowledge base text (empty with `--metrics-only`).
    pub knowledge_base: String,
    pub output: PathBuf,
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }

        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
            self.scraper.timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if let Some(ref kb) = args.knowledge_base {
            self.analysis.knowledge_base = Some(kb.display().to_string());
        }
    }

    /// Resolve the merged configuration into the value object for one run.
    ///
    /// Reads the knowledge base file unless `--metrics-only` was given.
    pub fn analysis_config(&self, args: &Args, now: DateTime<Utc>) -> Result<AnalysisConfig> {
        let username = args.normalized_username();

        let (gemini, knowledge_base) = if args.metrics_only {
            (None, String::new())
        } else {
            let kb_path = self.analysis.knowledge_base.as_deref().context(
                "A knowledge base file is required (--knowledge-base or [analysis].knowledge_base)",
            )?;
            let knowledge_base = std::fs::read_to_string(kb_path)
                .with_context(|| format!("Failed to read knowledge base: {}", kb_path))?;
            if knowledge_base.trim().is_empty() {
                anyhow::bail!("Knowledge base is empty: {}", kb_path);
            }

            let gemini = GeminiConfig {
                base_url: self.model.base_url.clone(),
                model_name: self.model.name.clone(),
                api_key: args.gemini_api_key.clone().unwrap_or_default(),
                temperature: self.model.temperature,
                timeout_seconds: self.model.timeout_seconds,
            };
            (Some(gemini), knowledge_base)
        };

        let source = SourceConfig {
            provider: self.scraper.provider,
            base_url: self.scraper.base_url.clone(),
            actor: self.scraper.actor.clone(),
            api_token: args.apify_token.clone(),
            timeout_seconds: self.scraper.timeout_seconds,
        };

        let output = match self.general.output {
            Some(ref path) => PathBuf::from(path),
            None => PathBuf::from(format!(
                "{}_report.{}",
                username.replace('.', "_"),
                args.format.extension()
            )),
        };

        Ok(AnalysisConfig {
            username,
            now,
            source,
            gemini,
            knowledge_base,
            output,
            format: args.format,
        })
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
