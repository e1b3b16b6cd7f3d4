//! Configuration types for document analysis.
//!
//! All behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. The prompt variants (what is sent, in which
//! language, which JSON layout is requested) are plain enums so that a single
//! binary can reproduce every variant without code changes.

use crate::error::AnalysisError;
use crate::progress::ProgressCallback;
use crate::provider::GenerativeModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variables searched for the API credential, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Largest base64 attachment sent inline. Raw files above roughly 15 MiB exceed it.
pub const DEFAULT_MAX_INLINE_BYTES: u64 = 20 * 1024 * 1024;

/// Configuration for one or more analyses.
///
/// # Example
/// ```rust
/// use doc_insights::{AnalysisConfig, Language, PromptPolicy};
///
/// let config = AnalysisConfig::builder()
///     .language(Language::Polish)
///     .policy(PromptPolicy::FilenameOnly)
///     .build()
///     .unwrap();
/// assert!(config.structured_output);
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Model identifier, e.g. "gemini-2.5-flash". If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// API credential. If None, the environment is searched (see [`API_KEY_ENV_VARS`]).
    pub api_key: Option<String>,

    /// Override for the provider's base URL. Used by tests and proxies.
    pub base_url: Option<String>,

    /// Pre-constructed model client. Takes precedence over `api_key`.
    pub provider: Option<Arc<dyn GenerativeModel>>,

    /// Whether the file content is transmitted or only its name. Default: content.
    pub policy: PromptPolicy,

    /// Prompt and presentation language. Default: English.
    pub language: Language,

    /// JSON layout requested from the model. Default: marketing verdict.
    pub shape: ResponseShape,

    /// Send a response schema so the model is forced to emit clean JSON. Default: true.
    ///
    /// When off, the reply may arrive wrapped in a markdown code fence and is
    /// unwrapped before parsing.
    pub structured_output: bool,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    pub max_output_tokens: usize,

    /// Retries on a transient API failure. Default: 0 (a single attempt).
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call HTTP timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Maximum size of the base64-encoded attachment. Default: 20 MiB.
    pub max_inline_bytes: u64,

    /// Custom instruction replacing the built-in template. `{file_name}` is substituted.
    pub prompt_template: Option<String>,

    /// Receives lifecycle events (request start, retry, completion).
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: None,
            api_key: None,
            base_url: None,
            provider: None,
            policy: PromptPolicy::default(),
            language: Language::default(),
            shape: ResponseShape::default(),
            structured_output: true,
            temperature: 0.2,
            max_output_tokens: 8192,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            max_inline_bytes: DEFAULT_MAX_INLINE_BYTES,
            prompt_template: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("policy", &self.policy)
            .field("language", &self.language)
            .field("shape", &self.shape)
            .field("structured_output", &self.structured_output)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_inline_bytes", &self.max_inline_bytes)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model that will be asked, falling back to [`DEFAULT_MODEL`].
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Find the API credential: explicit config first, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Same as [`resolve_api_key`](Self::resolve_api_key) with an injectable
    /// environment lookup. Empty values count as unset.
    pub fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }
}

/// Builder for [`AnalysisConfig`].
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl fmt::Debug for AnalysisConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn GenerativeModel>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn policy(mut self, policy: PromptPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub fn shape(mut self, shape: ResponseShape) -> Self {
        self.config.shape = shape;
        self
    }

    pub fn structured_output(mut self, v: bool) -> Self {
        self.config.structured_output = v;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_inline_bytes(mut self, n: u64) -> Self {
        self.config.max_inline_bytes = n;
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalysisError> {
        let c = &self.config;
        if c.max_output_tokens == 0 {
            return Err(AnalysisError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(AnalysisError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if let Some(ref t) = c.prompt_template {
            if t.trim().is_empty() {
                return Err(AnalysisError::InvalidConfig(
                    "prompt_template must not be empty".into(),
                ));
            }
        }
        if matches!(c.model.as_deref(), Some(m) if m.trim().is_empty()) {
            return Err(AnalysisError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What the model is given to work with.
///
/// | Policy | File read? | Model instruction |
/// |--------|-----------|-------------------|
/// | `DocumentContent` | yes, sent inline as base64 | analyse the actual content, never invent |
/// | `FilenameOnly` | no | infer plausible content from the name |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PromptPolicy {
    /// Transmit the file bytes and forbid fabrication. (default)
    #[default]
    DocumentContent,
    /// Reference the file by name only; the model produces a plausible analysis.
    FilenameOnly,
}

impl PromptPolicy {
    /// Whether the file bytes are read and attached to the request.
    pub fn sends_content(self) -> bool {
        matches!(self, PromptPolicy::DocumentContent)
    }
}

/// Language of the prompt, of the model's answer and of the rendered panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Polish,
}

/// JSON layout requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResponseShape {
    /// `{ insights: [], recommendations: [] }`
    Insights,
    /// `{ isMarketingData, analysis? { conclusions, suggestions, risks, criticalErrors }, reasoning? }` (default)
    #[default]
    MarketingVerdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AnalysisConfig::default();
        assert_eq!(c.model_name(), DEFAULT_MODEL);
        assert_eq!(c.policy, PromptPolicy::DocumentContent);
        assert_eq!(c.shape, ResponseShape::MarketingVerdict);
        assert_eq!(c.max_retries, 0);
        assert!(c.structured_output);
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = AnalysisConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_tokens() {
        let err = AnalysisConfig::builder().max_output_tokens(0).build();
        assert!(matches!(err, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_blank_template() {
        let err = AnalysisConfig::builder().prompt_template("  ").build();
        assert!(matches!(err, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn explicit_key_wins_over_env() {
        let c = AnalysisConfig::builder().api_key("from-config").build().unwrap();
        let key = c.resolve_api_key_with(|_| Some("from-env".into()));
        assert_eq!(key.as_deref(), Some("from-config"));
    }

    #[test]
    fn env_lookup_order_and_blank_values() {
        let c = AnalysisConfig::default();
        let key = c.resolve_api_key_with(|name| match name {
            "GEMINI_API_KEY" => Some("   ".into()),
            "API_KEY" => Some("fallback".into()),
            _ => None,
        });
        assert_eq!(key.as_deref(), Some("fallback"));
        assert_eq!(c.resolve_api_key_with(|_| None), None);
    }

    #[test]
    fn debug_redacts_key() {
        let c = AnalysisConfig::builder().api_key("secret-123").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-123"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn policy_sends_content() {
        assert!(PromptPolicy::DocumentContent.sends_content());
        assert!(!PromptPolicy::FilenameOnly.sends_content());
    }
}
