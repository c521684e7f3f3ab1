//! Apify Instagram profile scraper adapter.
//!
//! Runs the actor through the synchronous `run-sync-get-dataset-items`
//! endpoint, which blocks until the run finishes and returns the dataset
//! as a JSON array. The first item is the requested profile.

use super::{ProfileSource, ScraperError, SourceConfig};
use crate::models::{Post, PostKind, Profile};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

const PROVIDER: &str = "apify";

/// One dataset item as produced by the profile scraper actor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApifyProfileItem {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    owner_username: Option<String>,
    #[serde(default)]
    followers_count: Option<i64>,
    #[serde(default)]
    biography: Option<String>,
    #[serde(default)]
    external_url: Option<String>,
    #[serde(default)]
    latest_posts: Option<Vec<ApifyPost>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApifyPost {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    likes_count: Option<i64>,
    #[serde(default)]
    comments_count: Option<i64>,
    #[serde(default)]
    video_view_count: Option<i64>,
    #[serde(default)]
    caption: Option<String>,
}

impl From<ApifyPost> for Post {
    fn from(raw: ApifyPost) -> Self {
        Post {
            timestamp: raw.timestamp,
            kind: raw.kind.as_deref().map(PostKind::from).unwrap_or_default(),
            like_count: raw.likes_count,
            comment_count: raw.comments_count,
            video_view_count: raw.video_view_count,
            caption: raw.caption,
        }
    }
}

impl From<ApifyProfileItem> for Profile {
    fn from(item: ApifyProfileItem) -> Self {
        Profile {
            username: item.username.or(item.owner_username).unwrap_or_default(),
            follower_count: item
                .followers_count
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(0),
            biography: item.biography.unwrap_or_default(),
            external_url: item.external_url.unwrap_or_default(),
            posts: item
                .latest_posts
                .unwrap_or_default()
                .into_iter()
                .map(Post::from)
                .collect(),
        }
    }
}

/// Apify-backed [`ProfileSource`].
pub struct ApifyInstagramSource {
    client: reqwest::Client,
    base_url: String,
    actor: String,
    token: String,
}

impl ApifyInstagramSource {
    /// Create the adapter. Fails without a token so no request goes out unauthenticated.
    pub fn new(config: &SourceConfig) -> Result<Self, ScraperError> {
        let token = config
            .api_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ScraperError::MissingApiKey { provider: PROVIDER })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            actor: config.actor.clone(),
            token,
        })
    }

    /// Synchronous actor run endpoint.
    fn endpoint(&self) -> String {
        format!(
            "{}/v2/acts/{}/run-sync-get-dataset-items",
            self.base_url, self.actor
        )
    }
}

#[async_trait]
impl ProfileSource for ApifyInstagramSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_profile(&self, username: &str) -> Result<Profile, ScraperError> {
        let endpoint = self.endpoint();
        info!("Running Apify actor {} for @{}", self.actor, username);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "usernames": [username] }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound { endpoint });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint,
                body,
            });
        }

        let body = response.text().await?;
        let items: Vec<ApifyProfileItem> =
            serde_json::from_str(&body).map_err(|source| ScraperError::Deserialize {
                context: format!("Apify dataset for @{}", username),
                source,
            })?;

        debug!("Apify returned {} dataset items", items.len());

        let item = items.into_iter().next().ok_or_else(|| ScraperError::NoData {
            username: username.to_string(),
        })?;

        let profile = Profile::from(item);
        info!(
            "Fetched @{}: {} followers, {} posts",
            profile.username,
            profile.follower_count,
            profile.posts.len()
        );

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::ScraperProvider;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ACTOR: &str = "apify~instagram-profile-scraper";
    const ACTOR_PATH: &str = "/v2/acts/apify~instagram-profile-scraper/run-sync-get-dataset-items";

    fn source_for(server: &MockServer) -> ApifyInstagramSource {
        ApifyInstagramSource::new(&SourceConfig {
            provider: ScraperProvider::Apify,
            base_url: server.uri(),
            actor: ACTOR.to_string(),
            api_token: Some("test-token".to_string()),
            timeout_seconds: 5,
        })
        .expect("failed to build test source")
    }

    fn dataset_json() -> serde_json::Value {
        json!([{
            "username": "cozcoz.sleep",
            "followersCount": 48213,
            "biography": "Sleep goods 🛏️ kakao open chat below",
            "externalUrl": "https://linktr.ee/cozcoz",
            "latestPosts": [
                {
                    "timestamp": "2024-05-30T09:15:00.000Z",
                    "type": "Video",
                    "likesCount": 812,
                    "commentsCount": 41,
                    "videoViewCount": 20211,
                    "caption": "Group buy opens tomorrow!"
                },
                {
                    "timestamp": "2024-05-28T21:00:00.000Z",
                    "type": "Sidecar",
                    "likesCount": -1,
                    "commentsCount": 3
                }
            ]
        }])
    }

    #[tokio::test]
    async fn fetch_profile_maps_dataset_item() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ACTOR_PATH))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({"usernames": ["cozcoz.sleep"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(dataset_json()))
            .expect(1)
            .mount(&server)
            .await;

        let profile = source_for(&server)
            .fetch_profile("cozcoz.sleep")
            .await
            .expect("expected profile");

        assert_eq!(profile.username, "cozcoz.sleep");
        assert_eq!(profile.follower_count, 48213);
        assert_eq!(profile.external_url, "https://linktr.ee/cozcoz");
        assert_eq!(profile.posts.len(), 2);

        let reel = &profile.posts[0];
        assert_eq!(reel.kind, PostKind::Video);
        assert_eq!(reel.video_view_count, Some(20211));
        assert_eq!(reel.like_count, Some(812));

        let carousel = &profile.posts[1];
        assert_eq!(carousel.kind, PostKind::Sidecar);
        assert_eq!(carousel.like_count, Some(-1));
        assert_eq!(carousel.caption, None);
    }

    #[tokio::test]
    async fn fetch_profile_falls_back_to_owner_username() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ACTOR_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "ownerUsername": "cozcoz.sleep",
                "latestPosts": null
            }])))
            .mount(&server)
            .await;

        let profile = source_for(&server)
            .fetch_profile("cozcoz.sleep")
            .await
            .unwrap();

        assert_eq!(profile.username, "cozcoz.sleep");
        assert_eq!(profile.follower_count, 0);
        assert!(profile.biography.is_empty());
        assert!(profile.posts.is_empty());
    }

    #[tokio::test]
    async fn fetch_profile_empty_dataset_is_no_data() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ACTOR_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let result = source_for(&server).fetch_profile("private.acct").await;

        assert!(
            matches!(result, Err(ScraperError::NoData { ref username }) if username == "private.acct"),
            "expected NoData, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn fetch_profile_404_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ACTOR_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = source_for(&server).fetch_profile("cozcoz.sleep").await;

        match result {
            Err(ScraperError::NotFound { endpoint }) => {
                assert!(endpoint.ends_with("run-sync-get-dataset-items"));
                assert!(!endpoint.contains("test-token"));
            }
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_profile_server_error_keeps_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ACTOR_PATH))
            .respond_with(ResponseTemplate::new(402).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let result = source_for(&server).fetch_profile("cozcoz.sleep").await;

        assert!(
            matches!(
                result,
                Err(ScraperError::UnexpectedStatus { status: 402, ref body, .. }) if body == "quota exceeded"
            ),
            "expected UnexpectedStatus, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn fetch_profile_bad_json_is_deserialize_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ACTOR_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"error\": 1}"))
            .mount(&server)
            .await;

        let result = source_for(&server).fetch_profile("cozcoz.sleep").await;

        assert!(matches!(result, Err(ScraperError::Deserialize { .. })));
    }

    #[tokio::test]
    async fn fetch_profile_transport_error_hides_token() {
        let source = ApifyInstagramSource::new(&SourceConfig {
            provider: ScraperProvider::Apify,
            base_url: "http://127.0.0.1:1".to_string(),
            actor: ACTOR.to_string(),
            api_token: Some("SECRET-TOKEN-123".to_string()),
            timeout_seconds: 5,
        })
        .expect("failed to build test source");

        let err = source
            .fetch_profile("cozcoz.sleep")
            .await
            .expect_err("nothing listens on port 1");
        assert!(matches!(err, ScraperError::Http(_)), "got: {err:?}");

        let rendered = format!("{:#}", anyhow::Error::from(err));
        assert!(!rendered.contains("SECRET-TOKEN-123"), "{rendered}");
        assert_eq!(rendered.matches("error sending request").count(), 1, "{rendered}");
    }

    #[test]
    fn test_blank_token_is_rejected() {
        let result = ApifyInstagramSource::new(&SourceConfig {
            provider: ScraperProvider::Apify,
            base_url: "https://api.apify.com".to_string(),
            actor: ACTOR.to_string(),
            api_token: Some("   ".to_string()),
            timeout_seconds: 5,
        });
        assert!(matches!(result, Err(ScraperError::MissingApiKey { .. })));
    }
}
