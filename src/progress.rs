//! Progress-callback trait for analysis lifecycle events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to be told when
//! the remote call starts, is retried and finishes. The CLI uses this to drive
//! its spinner; a GUI front-end would flip its loading indicator.
//!
//! # Example
//!
//! ```rust
//! use doc_insights::{AnalysisConfig, AnalysisProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     requests: AtomicUsize,
//! }
//!
//! impl AnalysisProgressCallback for CountingCallback {
//!     fn on_request_start(&self, _file_name: &str, _attempt: u32) {
//!         self.requests.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { requests: AtomicUsize::new(0) });
//! let config = AnalysisConfig::builder()
//!     .progress_callback(counter as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the analysis pipeline as it moves through its steps.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once the file has been validated, before it is read.
    ///
    /// # Arguments
    /// * `file_name`: name of the selected file
    /// * `sends_content`: whether the bytes will be attached to the request
    fn on_analysis_start(&self, file_name: &str, sends_content: bool) {
        let _ = (file_name, sends_content);
    }

    /// Called just before each remote request (attempt 0 is the first).
    fn on_request_start(&self, file_name: &str, attempt: u32) {
        let _ = (file_name, attempt);
    }

    /// Called when a transient failure is about to be retried.
    ///
    /// # Arguments
    /// * `attempt`: the attempt that failed (0-indexed)
    /// * `backoff_ms`: delay before the next attempt
    /// * `error`: human-readable error description
    fn on_retry(&self, attempt: u32, backoff_ms: u64, error: &str) {
        let _ = (attempt, backoff_ms, error);
    }

    /// Called after the response was parsed into a result.
    fn on_analysis_complete(&self, file_name: &str, duration_ms: u64) {
        let _ = (file_name, duration_ms);
    }

    /// Called when the attempt ends with an error.
    fn on_analysis_error(&self, file_name: &str, error: &str) {
        let _ = (file_name, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        requests: AtomicUsize,
        retries: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl AnalysisProgressCallback for TrackingCallback {
        fn on_analysis_start(&self, _file_name: &str, _sends_content: bool) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_request_start(&self, _file_name: &str, _attempt: u32) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }

        fn on_retry(&self, _attempt: u32, _backoff_ms: u64, _error: &str) {
            self.retries.fetch_add(1, Ordering::SeqCst);
        }

        fn on_analysis_complete(&self, _file_name: &str, _duration_ms: u64) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_analysis_error(&self, _file_name: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_analysis_start("report.pdf", true);
        cb.on_request_start("report.pdf", 0);
        cb.on_retry(0, 500, "HTTP 503");
        cb.on_analysis_complete("report.pdf", 1200);
        cb.on_analysis_error("report.pdf", "boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_analysis_start("sales.csv", true);
        tracker.on_request_start("sales.csv", 0);
        tracker.on_retry(0, 500, "rate limited");
        tracker.on_request_start("sales.csv", 1);
        tracker.on_analysis_complete("sales.csv", 900);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.requests.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.retries.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_request_start("a.xlsx", 0);
    }
}
