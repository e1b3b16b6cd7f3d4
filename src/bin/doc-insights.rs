//! CLI binary for doc-insights.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, drives an `AnalysisSession` and prints its view.

use anyhow::{Context, Result};
use clap::Parser;
use doc_insights::pipeline::input::resolve_local;
use doc_insights::present::{config_banner, render};
use doc_insights::{
    write_report, AnalysisConfig, AnalysisError, AnalysisProgressCallback, AnalysisSession, Language,
    ProgressCallback, PromptPolicy, ResponseShape, Theme, ViewState, DEFAULT_MODEL,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner shown while the file is read and the model answers.
struct CliProgressCallback {
    bar: ProgressBar,
    theme: Theme,
}

impl CliProgressCallback {
    fn new(theme: Theme) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        Arc::new(Self { bar, theme })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self, file_name: &str, sends_content: bool) {
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.bar.set_prefix("Reading");
        let mode = if sends_content { "content" } else { "file name only" };
        self.bar.set_message(format!("{file_name} ({mode})"));
    }

    fn on_request_start(&self, file_name: &str, attempt: u32) {
        self.bar.set_prefix("Analysing");
        if attempt == 0 {
            self.bar.set_message(file_name.to_string());
        } else {
            self.bar.set_message(format!("{file_name} (attempt {})", attempt + 1));
        }
    }

    fn on_retry(&self, attempt: u32, backoff_ms: u64, error: &str) {
        let msg = if error.len() > 80 {
            let cut = error.char_indices().nth(79).map(|(i, _)| i).unwrap_or(error.len());
            format!("{}\u{2026}", &error[..cut])
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} attempt {} failed: {}  {}",
            self.theme.yellow("⚠"),
            attempt + 1,
            self.theme.red(&msg),
            self.theme.dim(&format!("retrying in {:.1}s", backoff_ms as f64 / 1000.0)),
        ));
    }

    fn on_analysis_complete(&self, file_name: &str, duration_ms: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} analysed in {}",
            self.theme.green("✔"),
            self.theme.bold(file_name),
            self.theme.dim(&format!("{:.1}s", duration_ms as f64 / 1000.0)),
        );
    }

    fn on_analysis_error(&self, _file_name: &str, _error: &str) {
        // The error itself is rendered by the session view.
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Marketing verdict for a PDF (panels on stdout)
  doc-insights campaign_q3.pdf

  # Insights + recommendations, in Polish
  doc-insights --shape insights --language polish leads.xlsx

  # Reference the file by name only (nothing is uploaded)
  doc-insights --policy filename-only budget_2025.csv

  # JSON report to stdout, or written atomically to a file
  doc-insights --json report.csv > verdict.json
  doc-insights report.csv -o verdict.json

  # Retry transient failures (429 / 5xx / timeouts)
  doc-insights --max-retries 3 large_export.xlsx

ACCEPTED FILES:
  By MIME type   application/pdf, text/csv, application/vnd.ms-excel,
                 application/vnd.openxmlformats-officedocument.spreadsheetml.sheet
  By extension   .csv, .xls, .xlsx   (case-insensitive)

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key
  API_KEY                 Fallback API key
  DOC_INSIGHTS_MODEL      Override model ID
  DOC_INSIGHTS_BASE_URL   Override the API base URL
  RUST_LOG                Log filter (overrides -v / -q)
"#;

/// Ask a generative model whether a document is marketing data.
#[derive(Parser, Debug)]
#[command(
    name = "doc-insights",
    version,
    about = "Ask a generative model whether a document is marketing data",
    long_about = "Send a PDF, CSV or spreadsheet (or only its name) to Google Gemini and \
render the structured answer: insights and recommendations, or a marketing verdict with \
conclusions, suggestions, risks and critical errors.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document to analyse (.pdf, .csv, .xls, .xlsx).
    file: Option<PathBuf>,

    /// Declared MIME type; guessed from the extension when omitted.
    #[arg(long, env = "DOC_INSIGHTS_MIME_TYPE")]
    mime_type: Option<String>,

    /// Gemini model ID.
    #[arg(long, env = "DOC_INSIGHTS_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// API key (defaults to GEMINI_API_KEY, then API_KEY).
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Override the API base URL.
    #[arg(long, env = "DOC_INSIGHTS_BASE_URL")]
    base_url: Option<String>,

    /// What the model is given: the document content or only its name.
    #[arg(long, env = "DOC_INSIGHTS_POLICY", value_enum, default_value = "document-content")]
    policy: PolicyArg,

    /// Language of the prompt, the answer and the panels.
    #[arg(long, env = "DOC_INSIGHTS_LANGUAGE", value_enum, default_value = "english")]
    language: LanguageArg,

    /// Response layout requested from the model.
    #[arg(long, env = "DOC_INSIGHTS_SHAPE", value_enum, default_value = "verdict")]
    shape: ShapeArg,

    /// Do not send a response schema; strip code fences from the reply instead.
    #[arg(long, env = "DOC_INSIGHTS_NO_SCHEMA")]
    no_schema: bool,

    /// Text file with a custom instruction; `{file_name}` is substituted.
    #[arg(long, env = "DOC_INSIGHTS_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "DOC_INSIGHTS_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max output tokens.
    #[arg(long, env = "DOC_INSIGHTS_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Retries on transient failures (0 = single attempt).
    #[arg(long, env = "DOC_INSIGHTS_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// API call timeout in seconds.
    #[arg(long, env = "DOC_INSIGHTS_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Print the full JSON report instead of text panels.
    #[arg(long, env = "DOC_INSIGHTS_JSON")]
    json: bool,

    /// Also write the JSON report to this file.
    #[arg(short, long, env = "DOC_INSIGHTS_OUTPUT")]
    output: Option<PathBuf>,

    /// Disable ANSI colours.
    #[arg(long, env = "DOC_INSIGHTS_NO_COLOR")]
    no_color: bool,

    /// Disable the spinner.
    #[arg(long, env = "DOC_INSIGHTS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC_INSIGHTS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "DOC_INSIGHTS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    DocumentContent,
    FilenameOnly,
}

impl From<PolicyArg> for PromptPolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::DocumentContent => PromptPolicy::DocumentContent,
            PolicyArg::FilenameOnly => PromptPolicy::FilenameOnly,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LanguageArg {
    #[value(alias = "en")]
    English,
    #[value(alias = "pl")]
    Polish,
}

impl From<LanguageArg> for Language {
    fn from(v: LanguageArg) -> Self {
        match v {
            LanguageArg::English => Language::English,
            LanguageArg::Polish => Language::Polish,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ShapeArg {
    Insights,
    Verdict,
}

impl From<ShapeArg> for ResponseShape {
    fn from(v: ShapeArg) -> Self {
        match v {
            ShapeArg::Insights => ResponseShape::Insights,
            ShapeArg::Verdict => ResponseShape::MarketingVerdict,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs; -v always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && io::stderr().is_terminal();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let theme = Theme {
        color: !cli.no_color && io::stdout().is_terminal(),
    };
    let err_theme = Theme {
        color: !cli.no_color && io::stderr().is_terminal(),
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new(err_theme) as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;
    let language = config.language;
    let mut session = AnalysisSession::new(config).context("Invalid configuration")?;

    if !session.is_configured() {
        eprintln!("{}", config_banner(language, err_theme));
    }

    // ── Select ───────────────────────────────────────────────────────────
    if let Some(ref path) = cli.file {
        let selected = resolve_local(path, cli.mime_type.as_deref())
            .and_then(|candidate| session.select_file(candidate));
        if let Err(e) = selected {
            eprint!("{}", render(&ViewState::Error(&e.to_string()), language, err_theme));
            return Ok(ExitCode::FAILURE);
        }
    }

    // ── Analyse ──────────────────────────────────────────────────────────
    if let Some(e) = session.analyze().await.err() {
        if let Some(panel) = failure_panel(&session, &e, err_theme) {
            eprint!("{panel}");
        }
        return Ok(ExitCode::FAILURE);
    }

    let output = session
        .result()
        .context("Analysis finished without a result")?;

    if let Some(ref path) = cli.output {
        write_report(output, path)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print!("{}", render(&session.view(), language, theme));
    }

    if !cli.quiet && !cli.json {
        let stats = &output.stats;
        eprintln!(
            "   {} tokens in  /  {} tokens out  ·  {}ms  ·  {}{}",
            err_theme.dim(&stats.input_tokens.to_string()),
            err_theme.dim(&stats.output_tokens.to_string()),
            stats.duration_ms,
            stats.model,
            if stats.retries > 0 {
                format!("  ·  {} retries", stats.retries)
            } else {
                String::new()
            },
        );
        if let Some(ref path) = cli.output {
            eprintln!("   {} {}", err_theme.green("→"), err_theme.bold(&path.display().to_string()));
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Map CLI args to `AnalysisConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .model(cli.model.clone())
        .policy(cli.policy.into())
        .language(cli.language.into())
        .shape(cli.shape.into())
        .structured_output(!cli.no_schema)
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(ref path) = cli.prompt_file {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt template from {:?}", path))?;
        builder = builder.prompt_template(template);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Error panel for a failed analysis, or `None` when the unconfigured banner
/// printed at startup already says it.
fn failure_panel(session: &AnalysisSession, err: &AnalysisError, theme: Theme) -> Option<String> {
    if matches!(err, AnalysisError::ApiKeyMissing) {
        return None;
    }
    Some(render(&session.view(), session.language(), theme))
}
