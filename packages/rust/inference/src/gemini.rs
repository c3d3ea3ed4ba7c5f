//! Google Gemini `generateContent` REST client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use topicpress_shared::{GeminiConfig, Result, TopicPressError};

use crate::provider::GenerationProvider;
use crate::sanitize::sanitize_request;

const USER_AGENT: &str = concat!("TopicPress/", env!("CARGO_PKG_VERSION"));

/// Resolved settings for [`GeminiClient`]. Built from [`GeminiConfig`] plus
/// the API key read from the environment.
#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub strip_params: Vec<String>,
}

impl GeminiSettings {
    pub fn from_config(config: &GeminiConfig, api_key: String) -> Self {
        Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            strip_params: config.strip_params.clone(),
        }
    }
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("strip_params", &self.strip_params)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

/// Join the text parts of the first candidate.
fn extract_text(response: GenerateResponse) -> Option<(String, Option<String>)> {
    let candidate = response.candidates.into_iter().next()?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    Some((text, candidate.finish_reason))
}

/// Turn an error body into a short message. Falls back to the raw body.
fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => {
            let code = env.error.code.unwrap_or(status.as_u16());
            let label = env.error.status.unwrap_or_default();
            let message = env.error.message.unwrap_or_default();
            format!("HTTP {code} {label}: {message}").trim().to_string()
        }
        Err(_) => {
            let snippet: String = body.chars().take(200).collect();
            format!("HTTP {status}: {snippet}")
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`GenerationProvider`] backed by the Gemini REST API.
pub struct GeminiClient {
    client: Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| TopicPressError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!(
            "{}/models/{model_id}:generateContent",
            self.settings.base_url
        )
    }

    fn request_body(&self, prompt: &str) -> Result<serde_json::Value> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_output_tokens,
            },
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| TopicPressError::parse(format!("failed to encode request: {e}")))?;
        Ok(sanitize_request(body, &self.settings.strip_params))
    }
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, prompt), fields(prompt_chars = prompt.len()))]
    async fn generate(&self, model_id: &str, prompt: &str) -> Result<String> {
        let body = self.request_body(prompt)?;

        let response = self
            .client
            .post(self.endpoint(model_id))
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TopicPressError::model(model_id, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TopicPressError::model(model_id, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(TopicPressError::model(model_id, describe_error(status, &text)));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| TopicPressError::model(model_id, format!("malformed response: {e}")))?;

        let Some((content, finish_reason)) = extract_text(parsed) else {
            return Err(TopicPressError::model(model_id, "response had no candidates"));
        };

        if content.trim().is_empty() {
            let reason = finish_reason.unwrap_or_else(|| "unknown".into());
            return Err(TopicPressError::model(
                model_id,
                format!("empty response (finish reason: {reason})"),
            ));
        }

        debug!(chars = content.len(), "model responded");
        Ok(content)
    }
}
