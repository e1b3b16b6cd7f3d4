//! One-shot analysis entry points.
//!
//! These functions run the whole pipeline for a single file and return the
//! parsed result: select → read → prompt → remote call → parse. Use
//! [`crate::session::AnalysisSession`] instead when you need the interactive
//! state (current selection, last error, view state) a front-end keeps.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::output::{AnalysisOutput, AnalysisStats, FileSummary};
use crate::pipeline::input::{self, FileCandidate, SelectedFile};
use crate::pipeline::{encode, llm, parse, request};
use crate::provider::{GeminiClient, GenerativeModel};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Analyse a local file.
///
/// The MIME type is guessed from the extension, as a file picker would.
///
/// # Errors
/// - Selection errors (`FileNotFound`, `UnsupportedFile`, …) come first
/// - `ApiKeyMissing` when no credential is configured; no request is made
/// - Remote and response errors from the call itself
///
/// # Example
/// ```rust,no_run
/// use doc_insights::{analyze, AnalysisConfig, AnalysisResult};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Key read from GEMINI_API_KEY / API_KEY
/// let output = analyze("campaign_q3.pdf", &AnalysisConfig::default()).await?;
/// if let AnalysisResult::Verdict(v) = &output.result {
///     println!("marketing: {}", v.is_marketing());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn analyze(
    path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let path = path.as_ref();
    info!("Starting analysis: {}", path.display());

    let candidate = input::resolve_local(path, None)?;
    analyze_candidate(candidate, config).await
}

/// Analyse a document already in memory.
///
/// `mime_type` is the declared type (may be empty; the extension of `name`
/// is then used for the allow-list check).
pub async fn analyze_bytes(
    name: impl Into<String>,
    mime_type: impl Into<String>,
    bytes: impl Into<Arc<[u8]>>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let candidate = FileCandidate::from_bytes(name, mime_type, bytes);
    info!("Starting analysis: {} (in memory)", candidate.name);
    analyze_candidate(candidate, config).await
}

/// Analyse a file and write the JSON report to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn analyze_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let output = analyze(path, config).await?;
    write_report(&output, output_path.as_ref()).await?;
    Ok(output)
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AnalysisError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(path, config))
}

/// Serialise `output` as pretty JSON and write it atomically.
pub async fn write_report(output: &AnalysisOutput, path: &Path) -> Result<(), AnalysisError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| AnalysisError::Internal(format!("Failed to serialise report: {e}")))?;

    let write_err = |e: std::io::Error| AnalysisError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    debug!("Report written to {}", path.display());
    Ok(())
}

/// Resolve the model client, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`): used as-is
/// 2. **Credential**: `config.api_key`, then `GEMINI_API_KEY`, then `API_KEY`,
///    wrapped in a [`GeminiClient`]
///
/// Returns [`AnalysisError::ApiKeyMissing`] when neither is available.
pub fn resolve_provider(config: &AnalysisConfig) -> Result<Arc<dyn GenerativeModel>, AnalysisError> {
    resolve_provider_with(config, |name| std::env::var(name).ok())
}

/// Same as [`resolve_provider`], reading environment variables through
/// `lookup` instead of the process environment.
pub fn resolve_provider_with(
    config: &AnalysisConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn GenerativeModel>, AnalysisError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let api_key = config
        .resolve_api_key_with(lookup)
        .ok_or(AnalysisError::ApiKeyMissing)?;
    Ok(Arc::new(GeminiClient::from_config(config, api_key)?))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn analyze_candidate(
    candidate: FileCandidate,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let file = input::validate_selection(candidate)?;
    let provider = resolve_provider(config)?;
    run(&provider, &file, config).await
}

/// Run one analysis of an already-validated file.
///
/// Shared by the one-shot functions and the session. Fires the progress
/// callbacks for start, completion and failure.
pub(crate) async fn run(
    provider: &Arc<dyn GenerativeModel>,
    file: &SelectedFile,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let start = Instant::now();
    let sends_content = config.policy.sends_content();

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start(file.name(), sends_content);
    }

    let result = run_inner(provider, file, config, start).await;

    match result {
        Ok(ref output) => {
            info!(
                "Analysis of '{}' complete: {} in / {} out tokens, {}ms",
                file.name(),
                output.stats.input_tokens,
                output.stats.output_tokens,
                output.stats.duration_ms
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_analysis_complete(file.name(), output.stats.duration_ms);
            }
        }
        Err(ref e) => {
            warn!("Analysis of '{}' failed: {}", file.name(), e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_analysis_error(file.name(), &e.to_string());
            }
        }
    }

    result
}

async fn run_inner(
    provider: &Arc<dyn GenerativeModel>,
    file: &SelectedFile,
    config: &AnalysisConfig,
    start: Instant,
) -> Result<AnalysisOutput, AnalysisError> {
    let contents = if config.policy.sends_content() {
        check_inline_size(file.name(), file.size_bytes(), config)?;
        let bytes = input::read_contents(file).await?;
        check_inline_size(file.name(), Some(bytes.len() as u64), config)?;
        Some(bytes)
    } else {
        debug!("Filename-only policy: '{}' is not read", file.name());
        None
    };

    let request = request::build_request(file, contents.as_deref(), config);
    let invocation = llm::invoke(provider, file.name(), &request, config).await?;
    let result = parse::parse_response(
        &invocation.response.text,
        config.shape,
        config.structured_output,
    )?;

    Ok(AnalysisOutput {
        file: FileSummary {
            name: file.name().to_string(),
            mime_type: file.mime_type().to_string(),
            size_bytes: contents
                .as_ref()
                .map(|b| b.len() as u64)
                .or(file.size_bytes()),
        },
        result,
        stats: AnalysisStats {
            model: provider.model().to_string(),
            input_tokens: invocation.response.input_tokens,
            output_tokens: invocation.response.output_tokens,
            duration_ms: start.elapsed().as_millis() as u64,
            retries: invocation.retries,
            content_sent: contents.is_some(),
        },
    })
}

fn check_inline_size(
    name: &str,
    size: Option<u64>,
    config: &AnalysisConfig,
) -> Result<(), AnalysisError> {
    let Some(size) = size else {
        return Ok(());
    };
    let encoded = encode::encoded_len(size);
    if encoded > config.max_inline_bytes {
        return Err(AnalysisError::FileTooLarge {
            name: name.to_string(),
            size,
            encoded,
            limit: config.max_inline_bytes,
        });
    }
    Ok(())
}
