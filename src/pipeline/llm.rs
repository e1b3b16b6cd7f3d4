//! Remote invocation: send one request to the model, optionally retrying.
//!
//! This is the only stage with network I/O. By default it makes exactly one
//! attempt; `max_retries > 0` enables exponential backoff
//! (`retry_backoff_ms * 2^attempt`) for transient failures only (429, 5xx,
//! timeouts, dropped connections). Auth errors and bad requests surface
//! immediately.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::provider::{GenerateRequest, GenerateResponse, GenerativeModel};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// A successful call together with how many retries it took.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub response: GenerateResponse,
    pub retries: u32,
}

/// Call the model for `file_name`, retrying transient failures per `config`.
pub async fn invoke(
    provider: &Arc<dyn GenerativeModel>,
    file_name: &str,
    request: &GenerateRequest,
    config: &AnalysisConfig,
) -> Result<Invocation, AnalysisError> {
    let start = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        if let Some(ref cb) = config.progress_callback {
            cb.on_request_start(file_name, attempt);
        }

        match provider.generate(request).await {
            Ok(response) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    file_name,
                    response.input_tokens,
                    response.output_tokens,
                    start.elapsed()
                );
                return Ok(Invocation {
                    response,
                    retries: attempt,
                });
            }
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                let backoff = backoff_ms(&e, config.retry_backoff_ms, attempt);
                warn!(
                    "{}: attempt {} failed ({}); retry {}/{} after {}ms",
                    file_name,
                    attempt + 1,
                    e,
                    attempt + 1,
                    config.max_retries,
                    backoff
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_retry(attempt, backoff, &e.to_string());
                }
                sleep(Duration::from_millis(backoff)).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("{}: attempt {} failed: {}", file_name, attempt + 1, e);
                return Err(e);
            }
        }
    }
}

/// Delay before the next attempt. A server-supplied `Retry-After` wins.
fn backoff_ms(err: &AnalysisError, base_ms: u64, attempt: u32) -> u64 {
    if let AnalysisError::RateLimitExceeded {
        retry_after_secs: Some(secs),
        ..
    } = err
    {
        return secs.saturating_mul(1000);
    }
    base_ms.saturating_mul(2u64.saturating_pow(attempt))
}
