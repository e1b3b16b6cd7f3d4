//! Generative-model abstraction.
//!
//! The pipeline talks to the remote model only through [`GenerativeModel`],
//! so tests and library users can substitute their own client (a mock, a
//! caching proxy, another vendor) via
//! [`crate::config::AnalysisConfigBuilder::provider`]. The bundled
//! implementation is [`gemini::GeminiClient`].

pub mod gemini;

use crate::error::AnalysisError;
use async_trait::async_trait;

pub use gemini::GeminiClient;

/// One piece of a user turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// Plain text instruction.
    Text(String),
    /// A file attached inline as base64.
    InlineData { mime_type: String, data: String },
}

impl Part {
    pub fn text(s: impl Into<String>) -> Self {
        Part::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(t) => Some(t),
            Part::InlineData { .. } => None,
        }
    }
}

/// A single-turn generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Instruction first, optional attachment after it.
    pub parts: Vec<Part>,
    /// JSON schema the reply must satisfy. `None` means free-form text.
    pub response_schema: Option<serde_json::Value>,
    pub temperature: f32,
    pub max_output_tokens: usize,
}

impl GenerateRequest {
    /// Whether any part carries file bytes.
    pub fn has_attachment(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, Part::InlineData { .. }))
    }
}

/// The text a model produced plus its token accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: Option<String>,
}

/// A remote model that turns a [`GenerateRequest`] into text.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Provider name used in logs and errors, e.g. `"gemini"`.
    fn name(&self) -> &str;

    /// Model identifier the requests are sent to.
    fn model(&self) -> &str;

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, AnalysisError>;
}
