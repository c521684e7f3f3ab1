//! Profile scraping providers.
//!
//! Every provider answers the same question: "give me the profile and the
//! latest posts for this username". Concrete vendors live in submodules and
//! are selected at runtime from [`SourceConfig`].

pub mod apify;

use crate::models::Profile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use apify::ApifyInstagramSource;

/// Errors surfaced by scraping providers.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("no API token configured for {provider}")]
    MissingApiKey { provider: &'static str },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no data returned for @{username} (private account or blocked)")]
    NoData { username: String },

    #[error("endpoint not found: {endpoint}")]
    NotFound { endpoint: String },

    #[error("unexpected HTTP status {status} from {endpoint}: {body}")]
    UnexpectedStatus {
        status: u16,
        endpoint: String,
        body: String,
    },
}

/// Capability shared by all scraping backends.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Short provider name for logs and report metadata.
    fn name(&self) -> &'static str;

    /// Fetch the public profile and its latest posts, newest first.
    async fn fetch_profile(&self, username: &str) -> Result<Profile, ScraperError>;
}

/// Which scraping backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScraperProvider {
    /// Apify actor run (synchronous dataset endpoint).
    #[default]
    Apify,
}

/// Per-run settings for the scraping provider.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub provider: ScraperProvider,
    pub base_url: String,
    /// Actor identifier, `owner~name` form.
    pub actor: String,
    pub api_token: Option<String>,
    pub timeout_seconds: u64,
}

/// Build the configured provider.
pub fn build_source(config: &SourceConfig) -> Result<Box<dyn ProfileSource>, ScraperError> {
    match config.provider {
        ScraperProvider::Apify => Ok(Box::new(ApifyInstagramSource::new(config)?)),
    }
}
