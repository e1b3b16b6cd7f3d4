//! Text rendering of the session's view state.
//!
//! Every state renders to a plain `String` so a terminal front-end can print
//! it and tests can assert on it. Colour is optional and controlled by
//! [`Theme`].

use crate::config::{Language, API_KEY_ENV_VARS};
use crate::output::{InsightReport, MarketingAnalysis};
use std::fmt::Write as _;

/// What a front-end should display. Exactly one state at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<'a> {
    /// No credential; the analyse action is disabled.
    Unconfigured,
    /// Waiting for a file or for the user to start the analysis.
    Idle { file_name: Option<&'a str> },
    /// A remote call is in flight.
    Loading { file_name: &'a str },
    /// The last attempt failed.
    Error(&'a str),
    /// The model judged the document to be unrelated to marketing.
    NotMarketing { reasoning: &'a str },
    Insights(&'a InsightReport),
    Verdict(&'a MarketingAnalysis),
}

/// ANSI colouring switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub color: bool,
}

impl Theme {
    pub const PLAIN: Theme = Theme { color: false };
    pub const ANSI: Theme = Theme { color: true };

    fn paint(self, code: &str, s: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    pub fn green(self, s: &str) -> String {
        self.paint("32", s)
    }

    pub fn red(self, s: &str) -> String {
        self.paint("31", s)
    }

    pub fn yellow(self, s: &str) -> String {
        self.paint("33", s)
    }

    pub fn dim(self, s: &str) -> String {
        self.paint("2", s)
    }

    pub fn bold(self, s: &str) -> String {
        self.paint("1", s)
    }

    pub fn cyan(self, s: &str) -> String {
        self.paint("36", s)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::PLAIN
    }
}

struct Labels {
    insights: &'static str,
    recommendations: &'static str,
    conclusions: &'static str,
    suggestions: &'static str,
    risks: &'static str,
    critical_errors: &'static str,
    results: &'static str,
    no_items: &'static str,
    idle: &'static str,
    ready: &'static str,
    analyzing: &'static str,
    error: &'static str,
    not_marketing: &'static str,
    unconfigured: &'static str,
}

const EN: Labels = Labels {
    insights: "Insights",
    recommendations: "Recommendations",
    conclusions: "Conclusions",
    suggestions: "Suggestions",
    risks: "Risks",
    critical_errors: "Critical errors",
    results: "Results",
    no_items: "No items to display.",
    idle: "Select a PDF, CSV or spreadsheet file to analyse.",
    ready: "Ready to analyse",
    analyzing: "Analysing",
    error: "Error",
    not_marketing: "Not marketing data",
    unconfigured: "API key is not configured. Set {var} in the environment to enable analysis.",
};

const PL: Labels = Labels {
    insights: "Spostrzeżenia",
    recommendations: "Rekomendacje",
    conclusions: "Wnioski",
    suggestions: "Sugestie",
    risks: "Ryzyka",
    critical_errors: "Błędy krytyczne",
    results: "Wyniki",
    no_items: "Brak elementów.",
    idle: "Wybierz plik PDF, CSV lub arkusz kalkulacyjny do analizy.",
    ready: "Gotowy do analizy",
    analyzing: "Analizowanie",
    error: "Błąd",
    not_marketing: "To nie są dane marketingowe",
    unconfigured: "Klucz API nie jest skonfigurowany. Ustaw {var} w środowisku, aby włączyć analizę.",
};

fn labels(language: Language) -> &'static Labels {
    match language {
        Language::English => &EN,
        Language::Polish => &PL,
    }
}

/// Banner shown while no credential is configured.
pub fn config_banner(language: Language, theme: Theme) -> String {
    let text = labels(language)
        .unconfigured
        .replace("{var}", API_KEY_ENV_VARS[0]);
    format!("{} {}", theme.yellow("!"), text)
}

/// Render `view` as text, ending with a newline.
pub fn render(view: &ViewState<'_>, language: Language, theme: Theme) -> String {
    let l = labels(language);
    let mut out = String::new();

    match *view {
        ViewState::Unconfigured => {
            out.push_str(&config_banner(language, theme));
            out.push('\n');
        }
        ViewState::Idle { file_name: None } => {
            let _ = writeln!(out, "{}", theme.dim(l.idle));
        }
        ViewState::Idle {
            file_name: Some(name),
        } => {
            let _ = writeln!(out, "{}: {}", l.ready, theme.bold(name));
        }
        ViewState::Loading { file_name } => {
            let _ = writeln!(out, "{} {} {}…", theme.cyan("⠋"), l.analyzing, theme.bold(file_name));
        }
        ViewState::Error(msg) => {
            let _ = writeln!(out, "{} {}: {}", theme.red("✗"), theme.bold(l.error), theme.red(msg));
        }
        ViewState::NotMarketing { reasoning } => {
            let _ = writeln!(out, "{} {}", theme.cyan("ℹ"), theme.bold(l.not_marketing));
            let _ = writeln!(out, "  {reasoning}");
        }
        ViewState::Insights(report) => {
            panel(&mut out, l.insights, &report.insights, l.no_items, theme);
            out.push('\n');
            panel(&mut out, l.recommendations, &report.recommendations, l.no_items, theme);
        }
        ViewState::Verdict(analysis) => {
            let panels = [
                (l.conclusions, &analysis.conclusions),
                (l.suggestions, &analysis.suggestions),
                (l.risks, &analysis.risks),
                (l.critical_errors, &analysis.critical_errors),
            ];
            let mut first = true;
            for (title, items) in panels.iter().filter(|(_, items)| !items.is_empty()) {
                if !first {
                    out.push('\n');
                }
                first = false;
                panel(&mut out, title, items, l.no_items, theme);
            }
            if first {
                panel(&mut out, l.results, &[], l.no_items, theme);
            }
        }
    }

    out
}

fn panel(out: &mut String, title: &str, items: &[String], placeholder: &str, theme: Theme) {
    let _ = writeln!(out, "{}", theme.bold(title));
    if items.is_empty() {
        let _ = writeln!(out, "  {}", theme.dim(placeholder));
        return;
    }
    for item in items {
        let _ = writeln!(out, "  {} {}", theme.green("•"), item);
    }
}
