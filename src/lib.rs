//! # doc-insights
//!
//! Ask a generative model whether a business document is marketing data, and
//! get back bullet-point findings as typed Rust values.
//!
//! The crate never parses PDF, CSV or spreadsheet content itself. It checks
//! the file against an allow-list, ships the bytes (or only the file name) to
//! the Gemini `generateContent` API with a JSON response schema, then unwraps
//! and validates what comes back.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Input    MIME / extension allow-list (pdf, csv, xls, xlsx)
//!  ├─ 2. Encode   file bytes → base64 inline attachment
//!  ├─ 3. Request  instruction + attachment + response schema
//!  ├─ 4. LLM      one call to Gemini (optional retry on 429/5xx)
//!  ├─ 5. Parse    strip ``` fences, decode JSON, check the shape
//!  └─ 6. Present  text panels, or the JSON report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc_insights::{analyze, AnalysisConfig, Language, PromptPolicy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from GEMINI_API_KEY (or API_KEY)
//!     let config = AnalysisConfig::builder()
//!         .language(Language::Polish)
//!         .policy(PromptPolicy::DocumentContent)
//!         .build()?;
//!     let output = analyze("leads_2024.xlsx", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Response Shapes
//!
//! | Shape | JSON | Rust |
//! |-------|------|------|
//! | `Insights` | `{ insights, recommendations }` | [`InsightReport`] |
//! | `MarketingVerdict` (default) | `{ isMarketingData, analysis?, reasoning? }` | [`MarketingVerdict`] |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc-insights` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod present;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{
    analyze, analyze_bytes, analyze_sync, analyze_to_file, resolve_provider, resolve_provider_with,
    write_report,
};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, Language, PromptPolicy, ResponseShape, DEFAULT_MODEL};
pub use error::AnalysisError;
pub use output::{
    AnalysisOutput, AnalysisResult, AnalysisStats, FileSummary, InsightReport, MarketingAnalysis,
    MarketingVerdict,
};
pub use pipeline::input::{FileCandidate, SelectedFile};
pub use present::{Theme, ViewState};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use provider::{GeminiClient, GenerateRequest, GenerateResponse, GenerativeModel, Part};
pub use session::{AnalysisSession, LoadingFlag};
