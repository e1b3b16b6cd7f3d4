//! In-memory analysis session: the state a front-end keeps between clicks.
//!
//! The session holds the selected file, a loading flag, the last error
//! message and the last result. Nothing is persisted; dropping the session
//! discards everything.
//!
//! [`AnalysisSession::analyze`] takes `&mut self`, so only one remote call
//! can be outstanding per session. While it is pending the session itself
//! cannot be borrowed; a UI task watches a [`LoadingFlag`] instead, or drives
//! its spinner from the progress callbacks as the CLI does.

use crate::analyze::{resolve_provider_with, run};
use crate::config::{AnalysisConfig, Language};
use crate::error::AnalysisError;
use crate::output::{AnalysisOutput, AnalysisResult, MarketingVerdict};
use crate::pipeline::input::{self, FileCandidate, SelectedFile};
use crate::present::ViewState;
use crate::provider::GenerativeModel;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared view of whether a session has a remote call in flight.
///
/// Cloned out of the session with [`AnalysisSession::loading_flag`] before
/// calling `analyze`, so another task can poll it while the call runs.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, loading: bool) {
        self.0.store(loading, Ordering::Release);
    }
}

/// Raises the flag for its lifetime. Dropping the analyze future (timeout,
/// `select!`, task abort) clears it the same way a normal return does.
struct InFlight<'a>(&'a LoadingFlag);

impl<'a> InFlight<'a> {
    fn start(flag: &'a LoadingFlag) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Interactive state for analysing one file at a time.
pub struct AnalysisSession {
    config: AnalysisConfig,
    /// `None` when no credential is configured.
    provider: Option<Arc<dyn GenerativeModel>>,
    selected: Option<SelectedFile>,
    loading: LoadingFlag,
    error: Option<String>,
    result: Option<AnalysisOutput>,
}

impl AnalysisSession {
    /// Create a session. A missing API key is not an error here: the session
    /// starts unconfigured and [`analyze`](Self::analyze) refuses to run.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::with_key_lookup(config, |name| std::env::var(name).ok())
    }

    /// Create a session that reads `GEMINI_API_KEY` / `API_KEY` through
    /// `lookup` instead of the process environment.
    pub fn with_key_lookup(
        config: AnalysisConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AnalysisError> {
        let provider = match resolve_provider_with(&config, lookup) {
            Ok(p) => Some(p),
            Err(AnalysisError::ApiKeyMissing) => {
                info!("No API key configured; analysis is disabled");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            config,
            provider,
            selected: None,
            loading: LoadingFlag::default(),
            error: None,
            result: None,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn language(&self) -> Language {
        self.config.language
    }

    /// Whether a credential (or a pre-built provider) is available.
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Whether the analyse action should be enabled.
    pub fn can_analyze(&self) -> bool {
        self.is_configured() && self.selected.is_some() && !self.is_loading()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// A handle that reports the in-flight state from another task.
    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&AnalysisOutput> {
        self.result.as_ref()
    }

    /// Offer a file to the session.
    ///
    /// On rejection the previous selection and result are dropped and the
    /// error message is kept for display. On acceptance the previous result
    /// and error are cleared and the file becomes the selection.
    pub fn select_file(&mut self, candidate: FileCandidate) -> Result<(), AnalysisError> {
        self.result = None;
        match input::validate_selection(candidate) {
            Ok(file) => {
                info!("Selected '{}'", file.name());
                self.selected = Some(file);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.selected = None;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Forget the current selection, result and error.
    pub fn clear(&mut self) {
        self.selected = None;
        self.result = None;
        self.error = None;
    }

    /// Run the analysis of the selected file.
    ///
    /// Checks, in order: a file is selected ([`AnalysisError::NoFileSelected`]),
    /// a credential is configured ([`AnalysisError::ApiKeyMissing`]). Neither
    /// failure issues a remote call. Any error is also kept as the session's
    /// last error; the session stays usable for another attempt, including
    /// when the returned future is dropped before it completes.
    pub async fn analyze(&mut self) -> Result<&AnalysisOutput, AnalysisError> {
        self.error = None;
        self.result = None;

        let Some(file) = self.selected.clone() else {
            return Err(self.fail(AnalysisError::NoFileSelected));
        };
        let Some(provider) = self.provider.clone() else {
            return Err(self.fail(AnalysisError::ApiKeyMissing));
        };

        let outcome = {
            let _in_flight = InFlight::start(&self.loading);
            run(&provider, &file, &self.config).await
        };

        match outcome {
            Ok(output) => Ok(&*self.result.insert(output)),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// What a front-end should show right now.
    ///
    /// Loading wins over everything; then an error; then a result; then the
    /// missing-credential banner; otherwise idle.
    pub fn view(&self) -> ViewState<'_> {
        if self.is_loading() {
            return ViewState::Loading {
                file_name: self.selected.as_ref().map(|f| f.name()).unwrap_or(""),
            };
        }
        if let Some(ref msg) = self.error {
            return ViewState::Error(msg);
        }
        if let Some(ref output) = self.result {
            return match output.result {
                AnalysisResult::Insights(ref report) => ViewState::Insights(report),
                AnalysisResult::Verdict(MarketingVerdict::Marketing(ref analysis)) => {
                    ViewState::Verdict(analysis)
                }
                AnalysisResult::Verdict(MarketingVerdict::NotMarketing { ref reasoning }) => {
                    ViewState::NotMarketing { reasoning }
                }
            };
        }
        if !self.is_configured() {
            return ViewState::Unconfigured;
        }
        ViewState::Idle {
            file_name: self.selected.as_ref().map(|f| f.name()),
        }
    }

    fn fail(&mut self, e: AnalysisError) -> AnalysisError {
        self.error = Some(e.to_string());
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MarketingAnalysis;
    use crate::provider::{GenerateRequest, GenerateResponse};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct Fixed {
        reply: Result<&'static str, u16>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn ok(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                calls: AtomicUsize::new(0),
            })
        }

        fn status(code: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(code),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl GenerativeModel for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed-1"
        }

        async fn generate(&self, _request: &GenerateRequest) -> Result<GenerateResponse, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Ok(text) => Ok(GenerateResponse {
                    text: text.to_string(),
                    ..Default::default()
                }),
                Err(status) => Err(AnalysisError::ApiError {
                    status,
                    message: "quota exhausted".into(),
                }),
            }
        }
    }

    const MARKETING: &str = r#"{"isMarketingData": true, "analysis": {"conclusions": ["c"], "suggestions": [], "risks": [], "criticalErrors": []}}"#;
    const NOT_MARKETING: &str = r#"{"isMarketingData": false, "reasoning": "Timesheet"}"#;

    fn session(model: Arc<Fixed>) -> AnalysisSession {
        let config = AnalysisConfig::builder().provider(model).build().unwrap();
        AnalysisSession::new(config).unwrap()
    }

    fn csv() -> FileCandidate {
        FileCandidate::from_bytes("leads.csv", "text/csv", b"a\n1\n".to_vec())
    }

    #[test]
    fn without_key_session_is_unconfigured() {
        let mut s = AnalysisSession::with_key_lookup(AnalysisConfig::default(), |_| None).unwrap();
        assert!(!s.is_configured());
        assert_eq!(s.view(), ViewState::Unconfigured);

        s.select_file(csv()).unwrap();
        assert!(!s.can_analyze());
        let err = tokio_test::block_on(s.analyze()).unwrap_err();
        assert!(matches!(err, AnalysisError::ApiKeyMissing));
        assert!(s.last_error().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn analyze_without_selection_fails_without_calling() {
        let model = Fixed::ok(MARKETING);
        let mut s = session(model.clone());
        let err = s.analyze().await.unwrap_err();
        assert!(matches!(err, AnalysisError::NoFileSelected));
        assert_eq!(s.view(), ViewState::Error("Please select a file first."));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_analysis_is_kept() {
        let model = Fixed::ok(MARKETING);
        let mut s = session(model.clone());
        s.select_file(csv()).unwrap();
        assert!(s.can_analyze());

        let out = s.analyze().await.unwrap();
        assert!(matches!(out.result, AnalysisResult::Verdict(MarketingVerdict::Marketing(_))));
        assert!(!s.is_loading());
        assert!(s.last_error().is_none());
        match s.view() {
            ViewState::Verdict(MarketingAnalysis { conclusions, .. }) => {
                assert_eq!(conclusions, &vec!["c".to_string()])
            }
            other => panic!("unexpected view {other:?}"),
        }
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn not_marketing_view() {
        let mut s = session(Fixed::ok(NOT_MARKETING));
        s.select_file(csv()).unwrap();
        s.analyze().await.unwrap();
        assert_eq!(s.view(), ViewState::NotMarketing { reasoning: "Timesheet" });
    }

    #[tokio::test]
    async fn rejected_selection_drops_previous_result_and_file() {
        let mut s = session(Fixed::ok(MARKETING));
        s.select_file(csv()).unwrap();
        s.analyze().await.unwrap();
        assert!(s.result().is_some());

        let err = s
            .select_file(FileCandidate::from_bytes("logo.png", "image/png", vec![0u8; 4]))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedFile { .. }));
        assert!(s.result().is_none());
        assert!(s.selected_file().is_none());
        assert!(matches!(s.view(), ViewState::Error(_)));
    }

    #[tokio::test]
    async fn accepted_selection_clears_error_and_result() {
        let mut s = session(Fixed::ok(MARKETING));
        let _ = s.select_file(FileCandidate::from_bytes("a.txt", "text/plain", Vec::<u8>::new()));
        assert!(s.last_error().is_some());

        s.select_file(csv()).unwrap();
        assert!(s.last_error().is_none());
        assert_eq!(s.view(), ViewState::Idle { file_name: Some("leads.csv") });
    }

    #[tokio::test]
    async fn remote_failure_keeps_session_usable() {
        let model = Fixed::status(429);
        let mut s = session(model.clone());
        s.select_file(csv()).unwrap();
        assert!(s.analyze().await.is_err());
        assert!(s.last_error().unwrap().contains("quota exhausted"));
        assert!(s.selected_file().is_some());
        assert!(s.can_analyze());

        assert!(s.analyze().await.is_err());
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn key_from_injected_environment_configures_session() {
        let s = AnalysisSession::with_key_lookup(AnalysisConfig::default(), |name| {
            (name == "GEMINI_API_KEY").then(|| "k".to_string())
        })
        .unwrap();
        assert!(s.is_configured());
        assert_eq!(s.view(), ViewState::Idle { file_name: None });
    }

    /// Never answers within the test's patience.
    struct Slow;

    #[async_trait]
    impl GenerativeModel for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn model(&self) -> &str {
            "slow-1"
        }

        async fn generate(&self, _request: &GenerateRequest) -> Result<GenerateResponse, AnalysisError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(GenerateResponse::default())
        }
    }

    fn slow_session() -> AnalysisSession {
        let config = AnalysisConfig::builder().provider(Arc::new(Slow)).build().unwrap();
        let mut s = AnalysisSession::new(config).unwrap();
        s.select_file(csv()).unwrap();
        s
    }

    #[tokio::test]
    async fn loading_flag_is_visible_while_call_is_pending() {
        let mut s = slow_session();
        let flag = s.loading_flag();
        assert!(!flag.is_loading());

        {
            let fut = s.analyze();
            tokio::pin!(fut);
            tokio::select! {
                _ = &mut fut => panic!("slow provider answered"),
                _ = tokio::time::sleep(Duration::from_millis(20)) => {}
            }
            assert!(flag.is_loading());
        }

        assert!(!flag.is_loading());
        assert!(!s.is_loading());
        assert!(s.can_analyze());
        assert_eq!(s.view(), ViewState::Idle { file_name: Some("leads.csv") });
    }

    #[tokio::test]
    async fn timed_out_analysis_does_not_leave_session_loading() {
        let mut s = slow_session();
        let elapsed = tokio::time::timeout(Duration::from_millis(20), s.analyze()).await;
        assert!(elapsed.is_err());

        assert!(!s.is_loading());
        assert!(s.can_analyze());
        assert!(!matches!(s.view(), ViewState::Loading { .. }));
    }

    #[tokio::test]
    async fn incomplete_verdict_surfaces_as_error() {
        let mut s = session(Fixed::ok(r#"{"isMarketingData": true}"#));
        s.select_file(csv()).unwrap();
        let err = s.analyze().await.unwrap_err();
        assert!(matches!(err, AnalysisError::IncompleteVerdict { .. }));
        assert!(s.result().is_none());
    }
}
