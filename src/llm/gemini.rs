//! Gemini `generateContent` client.
//!
//! Sends the assessment prompt in one request with JSON response mode
//! enabled and parses the returned text into a [`PartnerAssessment`].

use crate::llm::prompt::build_prompt;
use crate::models::{MetricsSummary, PartnerAssessment};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model_name: String,
    pub api_key: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model_name: "gemini-2.0-flash".to_string(),
            api_key: String::new(),
            temperature: 0.4,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Client for the hosted model.
pub struct GeminiClient {
    config: GeminiConfig,
    http_client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            anyhow::bail!("Gemini API key is missing (set GEMINI_API_KEY or pass --gemini-api-key)");
        }

        info!("Initializing Gemini client with model {}", config.model_name);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Model name, for report metadata.
    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    /// Ask the model for a partner assessment of `summary`.
    pub async fn assess(
        &self,
        summary: &MetricsSummary,
        knowledge_base: &str,
    ) -> Result<PartnerAssessment> {
        let prompt = build_prompt(summary, knowledge_base);
        debug!("Prompt is {} characters", prompt.chars().count());

        let text = self.generate(&prompt).await?;
        parse_assessment(&text)
    }

    /// Send a prompt and return the concatenated text of the first candidate.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model_name
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                response_mime_type: "application/json",
            },
        };

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Request timed out after {}s", self.config.timeout_seconds)
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to Gemini at {}", self.config.base_url)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Gemini API error {}: {}", status, body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .context("Gemini returned no candidates")?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                warn!("Gemini finished with reason {}", reason);
            }
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            anyhow::bail!("Gemini returned an empty response");
        }

        Ok(text)
    }
}

/// Parse the model's JSON answer, tolerating a Markdown code fence around it.
pub fn parse_assessment(text: &str) -> Result<PartnerAssessment> {
    let body = strip_code_fence(text);
    serde_json::from_str(body).with_context(|| {
        let preview: String = body.chars().take(200).collect();
        format!("Model response is not the expected JSON: {}", preview)
    })
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (`json`) on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ASSESSMENT_JSON: &str = r#"{
        "contact": "[Email] cozcoz@example.com",
        "authenticity": {
            "group_buy_count": "4 (healthy)",
            "buildup_index": "3 posts per campaign (strong)",
            "recent_sales_list": "Cooling pillow, bamboo sheets"
        },
        "power": {
            "true_fans": "12.5% (34 people)",
            "buying_signal": "Many 'ordered!' comments",
            "cs_signal": "Replies within hours"
        },
        "strategy": "Pitch the summer cooling line",
        "message": "Hello!\n- Cooling pillow"
    }"#;

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            timeout_seconds: 5,
            ..Default::default()
        })
        .expect("failed to build test client")
    }

    fn summary() -> MetricsSummary {
        MetricsSummary {
            username: "cozcoz.sleep".to_string(),
            follower_count: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_gemini_config_default() {
        let config = GeminiConfig::default();
        assert_eq!(config.model_name, "gemini-2.0-flash");
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_new_requires_api_key() {
        assert!(GeminiClient::new(GeminiConfig::default()).is_err());
    }

    #[test]
    fn test_parse_assessment_plain() {
        let assessment = parse_assessment(ASSESSMENT_JSON).unwrap();
        assert_eq!(assessment.contact, "[Email] cozcoz@example.com");
        assert_eq!(assessment.authenticity.group_buy_count, "4 (healthy)");
        assert_eq!(assessment.power.cs_signal, "Replies within hours");
        assert_eq!(assessment.message, "Hello!\n- Cooling pillow");
    }

    #[test]
    fn test_parse_assessment_fenced() {
        let fenced = format!("```json\n{}\n```\n", ASSESSMENT_JSON);
        let assessment = parse_assessment(&fenced).unwrap();
        assert_eq!(assessment.strategy, "Pitch the summer cooling line");
    }

    #[test]
    fn test_parse_assessment_rejects_prose() {
        let err = parse_assessment("Sorry, I cannot help with that.").unwrap_err();
        assert!(err.to_string().contains("not the expected JSON"));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("  {}  "), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn assess_sends_json_mode_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": ASSESSMENT_JSON}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let assessment = client_for(&server)
            .assess(&summary(), "Cooling pillow 39,000 KRW")
            .await
            .expect("expected assessment");

        assert_eq!(assessment.power.true_fans, "12.5% (34 people)");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("Cooling pillow 39,000 KRW"));
    }

    #[tokio::test]
    async fn assess_surfaces_api_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key invalid"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .assess(&summary(), "kb")
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("403"));
        assert!(message.contains("API key invalid"));
    }

    #[tokio::test]
    async fn assess_rejects_empty_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .assess(&summary(), "kb")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no candidates"));
    }
}
