//! Google Gemini `generateContent` client.
//!
//! Request layout:
//!
//! ```text
//! POST {base}/v1beta/models/{model}:generateContent
//! x-goog-api-key: …
//! { "contents": [{ "role": "user", "parts": [ {text}, {inlineData}? ] }],
//!   "generationConfig": { temperature, maxOutputTokens, responseMimeType?, responseSchema? } }
//! ```

use super::{GenerateRequest, GenerateResponse, GenerativeModel, Part};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Public endpoint of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const PROVIDER: &str = "gemini";

/// HTTP client for one Gemini model.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Build a client from the config's model, timeout and base-URL override.
    pub fn from_config(config: &AnalysisConfig, api_key: String) -> Result<Self, AnalysisError> {
        let client = Self::new(
            api_key,
            config.model_name(),
            Duration::from_secs(config.api_timeout_secs),
        )?;
        Ok(match config.base_url {
            Some(ref url) => client.with_base_url(url.clone()),
            None => client,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, AnalysisError> {
        let body = WireRequest::from(request);
        let start = Instant::now();

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, start))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text, retry_after_secs));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, start))?;
        debug!(
            "Gemini replied in {}ms ({} candidates)",
            start.elapsed().as_millis(),
            wire.candidates.len()
        );
        wire.into_response()
    }
}

fn transport_error(e: reqwest::Error, start: Instant) -> AnalysisError {
    if e.is_timeout() {
        AnalysisError::ApiTimeout {
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    } else if e.is_decode() {
        AnalysisError::MalformedResponse {
            reason: format!("provider envelope: {e}"),
            preview: String::new(),
        }
    } else {
        AnalysisError::Transport(e.to_string())
    }
}

/// Map a non-2xx status and its body to an error.
fn status_error(status: StatusCode, body: &str, retry_after_secs: Option<u64>) -> AnalysisError {
    let message = serde_json::from_str::<WireErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            }
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AnalysisError::AuthError {
            provider: PROVIDER.to_string(),
            detail: message,
        },
        StatusCode::TOO_MANY_REQUESTS => AnalysisError::RateLimitExceeded {
            provider: PROVIDER.to_string(),
            retry_after_secs,
        },
        _ => AnalysisError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    contents: Vec<WireContent<'a>>,
    generation_config: WireGenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    role: &'static str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: WireBlob<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig<'a> {
    temperature: f32,
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a serde_json::Value>,
}

impl<'a> From<&'a GenerateRequest> for WireRequest<'a> {
    fn from(req: &'a GenerateRequest) -> Self {
        let parts = req
            .parts
            .iter()
            .map(|p| match p {
                Part::Text(text) => WirePart::Text { text },
                Part::InlineData { mime_type, data } => WirePart::Inline {
                    inline_data: WireBlob { mime_type, data },
                },
            })
            .collect();

        WireRequest {
            contents: vec![WireContent { role: "user", parts }],
            generation_config: WireGenerationConfig {
                temperature: req.temperature,
                max_output_tokens: req.max_output_tokens,
                response_mime_type: req
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json"),
                response_schema: req.response_schema.as_ref(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    usage_metadata: Option<WireUsage>,
    prompt_feedback: Option<WirePromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    content: Option<WireCandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCandidateContent {
    #[serde(default)]
    parts: Vec<WireTextPart>,
}

#[derive(Debug, Deserialize)]
struct WireTextPart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireErrorEnvelope {
    error: WireErrorBody,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    message: Option<String>,
}

impl WireResponse {
    fn into_response(self) -> Result<GenerateResponse, AnalysisError> {
        let usage = self.usage_metadata.unwrap_or_default();
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(AnalysisError::EmptyResponse {
                finish_reason: block_reason,
            });
        };

        let text: String = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse {
                finish_reason: candidate.finish_reason,
            });
        }

        Ok(GenerateResponse {
            text,
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            finish_reason: candidate.finish_reason,
        })
    }
}
