//! Data models for the partner miner.
//!
//! This module contains the core data structures used throughout
//! the application for representing profiles, posts, metrics, and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content category of a post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostKind {
    /// Video / reel content. The only kind that carries view counts.
    Video,
    /// Single image (the default when the provider omits the tag).
    #[default]
    Image,
    /// Carousel of several media items.
    Sidecar,
    /// Anything the provider invents later.
    Other(String),
}

impl PostKind {
    pub fn is_video(&self) -> bool {
        matches!(self, PostKind::Video)
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostKind::Video => write!(f, "Video"),
            PostKind::Image => write!(f, "Image"),
            PostKind::Sidecar => write!(f, "Sidecar"),
            PostKind::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for PostKind {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "video" | "reel" | "clips" => PostKind::Video,
            "image" | "photo" | "" => PostKind::Image,
            "sidecar" | "carousel" => PostKind::Sidecar,
            _ => PostKind::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for PostKind {
    fn from(s: String) -> Self {
        PostKind::from(s.as_str())
    }
}

impl From<PostKind> for String {
    fn from(kind: PostKind) -> Self {
        kind.to_string()
    }
}

/// A single post as received from the scraping provider.
///
/// Every field is optional because providers routinely omit them. Counts are
/// signed so that garbage from upstream survives deserialization; the
/// aggregator clamps negatives to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Raw timestamp string, e.g. `2024-01-01T10:00:00.000Z`.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub kind: PostKind,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub comment_count: Option<i64>,
    /// Present only on video posts.
    #[serde(default)]
    pub video_view_count: Option<i64>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Public profile data plus its latest posts, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub follower_count: u64,
    pub biography: String,
    pub external_url: String,
    /// Latest posts, assumed newest first.
    #[serde(default)]
    pub posts: Vec<Post>,
}

/// A post reduced to the fields the LLM prompt needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplePost {
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub caption: String,
    #[serde(rename = "likes")]
    pub like_count: u64,
    #[serde(rename = "comments")]
    pub comment_count: u64,
}

/// Engagement statistics for one profile snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub username: String,
    pub follower_count: u64,
    pub biography: String,
    pub external_url: String,
    /// Size of the working sample (after fallback, if it triggered).
    pub recent_post_count: usize,
    pub average_likes: u64,
    pub average_comments: u64,
    pub average_video_views: u64,
    /// At most 15 entries.
    pub sample_posts: Vec<SamplePost>,
}

/// Group-buy authenticity indicators estimated by the LLM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Authenticity {
    /// Estimated group-buy campaigns in the last 30 days.
    #[serde(alias = "gonggu_count")]
    pub group_buy_count: String,
    /// Teaser / open / close posts per campaign.
    pub buildup_index: String,
    /// Product names sold in the last month.
    pub recent_sales_list: String,
}

/// Audience buying-power indicators estimated by the LLM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyingPower {
    pub true_fans: String,
    pub buying_signal: String,
    pub cs_signal: String,
}

/// Structured response from the LLM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartnerAssessment {
    /// Contact point extracted from the bio or link (KakaoTalk open chat, email).
    pub contact: String,
    pub authenticity: Authenticity,
    pub power: BuyingPower,
    pub strategy: String,
    /// Copy-ready outreach proposal.
    pub message: String,
}

/// Metadata about a report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Instagram username that was analyzed.
    pub username: String,
    /// Reference instant used for the 30-day window.
    pub analysis_date: DateTime<Utc>,
    /// Scraping provider that supplied the data.
    pub source: String,
    /// LLM model name, if an assessment was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    /// Number of posts returned by the provider.
    pub posts_fetched: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete partner report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub metrics: MetricsSummary,
    /// Missing when running with `--metrics-only`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<PartnerAssessment>,
}
