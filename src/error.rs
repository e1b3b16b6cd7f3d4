//! Error types for the doc-insights library.
//!
//! Every failure is terminal for the current analysis attempt only. A
//! [`crate::session::AnalysisSession`] stores the message of the last error
//! and stays usable, so the user can pick another file or simply try again.
//!
//! The variants are grouped the way a user experiences them:
//!
//! * **Selection**: the chosen file is missing, unreadable or not one of the
//!   accepted document types.
//! * **Credential**: no API key was configured, so the action is blocked.
//! * **Remote**: the generative-model call failed (network, auth, quota).
//! * **Response**: the call succeeded but the text could not be turned into
//!   one of the expected result shapes.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the doc-insights library.
#[derive(Debug, Error)]
pub enum AnalysisError {
    // ── Selection errors ──────────────────────────────────────────────────
    /// Analysis was triggered before any file was selected.
    #[error("Please select a file first.")]
    NoFileSelected,

    /// The file's MIME type and extension are both outside the allow-list.
    #[error(
        "Unsupported file '{name}' (type: {mime_type}).\nPlease choose a PDF, CSV, XLS or XLSX document."
    )]
    UnsupportedFile { name: String, mime_type: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was selected but reading its bytes failed.
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The encoded file is larger than the provider accepts as an inline attachment.
    #[error(
        "File '{name}' is {size} bytes ({encoded} bytes as base64); inline uploads are limited to {limit} bytes"
    )]
    FileTooLarge {
        name: String,
        size: u64,
        encoded: u64,
        limit: u64,
    },

    // ── Credential errors ─────────────────────────────────────────────────
    /// No API key was found in the config or the environment.
    #[error(
        "The analysis service is not configured: no API key found.\nSet GEMINI_API_KEY (or API_KEY) in the deployment environment."
    )]
    ApiKeyMissing,

    // ── Remote errors ─────────────────────────────────────────────────────
    /// The API rejected the credential (HTTP 401/403).
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    /// The API returned HTTP 429.
    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimitExceeded {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// The API call did not finish within the configured timeout.
    #[error("API call timed out after {elapsed_ms}ms")]
    ApiTimeout { elapsed_ms: u64 },

    /// Any other non-success HTTP status.
    #[error("LLM API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Connection-level failure before an HTTP status was received.
    #[error("Request to the analysis service failed: {0}")]
    Transport(String),

    /// The API answered but produced no text (blocked prompt, safety stop, …).
    #[error("The model returned no text (finish reason: {})", finish_reason.as_deref().unwrap_or("unknown"))]
    EmptyResponse { finish_reason: Option<String> },

    // ── Response errors ───────────────────────────────────────────────────
    /// The response text is not valid JSON.
    #[error("Could not parse the model response as JSON: {reason}\nRaw response: {preview}")]
    MalformedResponse { reason: String, preview: String },

    /// Valid JSON, but a required field is missing or has the wrong type.
    #[error("The model response has an unexpected shape: {reason}\nRaw response: {preview}")]
    UnexpectedShape { reason: String, preview: String },

    /// `isMarketingData` disagrees with the fields that were supplied.
    #[error(
        "The model response is incomplete: isMarketingData is {is_marketing} but '{missing}' is missing\nRaw response: {preview}"
    )]
    IncompleteVerdict {
        is_marketing: bool,
        missing: &'static str,
        preview: String,
    },

    // ── Config / output errors ────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not write the JSON report.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Quota, timeout, 5xx and connection failures are transient; bad keys,
    /// 4xx and unparseable responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            AnalysisError::RateLimitExceeded { .. }
            | AnalysisError::ApiTimeout { .. }
            | AnalysisError::Transport(_) => true,
            AnalysisError::ApiError { status, .. } => *status == 408 || *status >= 500,
            _ => false,
        }
    }
}
