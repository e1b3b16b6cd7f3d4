//! Result types produced by an analysis.
//!
//! The model answers in one of two JSON layouts. Shape A is
//! [`InsightReport`]; Shape B is [`MarketingVerdict`], which is an enum here
//! rather than a struct with two optional halves: a verdict either carries an
//! analysis (marketing document) or a reasoning string (anything else), and
//! the parser refuses replies where the flag and the payload disagree.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Shape A: free-form insights plus recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightReport {
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// The four bullet lists of a marketing document analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingAnalysis {
    pub conclusions: Vec<String>,
    pub suggestions: Vec<String>,
    pub risks: Vec<String>,
    pub critical_errors: Vec<String>,
}

impl MarketingAnalysis {
    /// True when every list is empty.
    pub fn is_empty(&self) -> bool {
        self.conclusions.is_empty()
            && self.suggestions.is_empty()
            && self.risks.is_empty()
            && self.critical_errors.is_empty()
    }
}

/// Shape B: whether the document is marketing-related, with the matching payload.
///
/// Serialises to and from the wire form
/// `{ "isMarketingData": bool, "analysis"?: {...}, "reasoning"?: "..." }`.
/// Only the branch selected by the flag is decoded; the other one is ignored
/// whatever it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "VerdictWire", try_from = "VerdictReply")]
pub enum MarketingVerdict {
    Marketing(MarketingAnalysis),
    NotMarketing { reasoning: String },
}

impl MarketingVerdict {
    pub fn is_marketing(&self) -> bool {
        matches!(self, MarketingVerdict::Marketing(_))
    }
}

/// Wire form written for a [`MarketingVerdict`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerdictWire {
    is_marketing_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<MarketingAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<String>,
}

impl From<MarketingVerdict> for VerdictWire {
    fn from(v: MarketingVerdict) -> Self {
        match v {
            MarketingVerdict::Marketing(analysis) => VerdictWire {
                is_marketing_data: true,
                analysis: Some(analysis),
                reasoning: None,
            },
            MarketingVerdict::NotMarketing { reasoning } => VerdictWire {
                is_marketing_data: false,
                analysis: None,
                reasoning: Some(reasoning),
            },
        }
    }
}

/// Wire form read from a model reply. Both payloads stay untyped until the
/// flag says which one matters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerdictReply {
    pub is_marketing_data: bool,
    #[serde(default)]
    pub analysis: Option<Value>,
    #[serde(default)]
    pub reasoning: Option<Value>,
}

/// Why a [`VerdictReply`] could not become a [`MarketingVerdict`].
#[derive(Debug)]
pub(crate) enum VerdictError {
    /// The flag requires this field but the reply lacks it (or it is null).
    Missing(&'static str),
    /// The selected payload has the wrong shape.
    Invalid(serde_json::Error),
}

impl fmt::Display for VerdictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictError::Missing(field) => write!(f, "missing field `{field}`"),
            VerdictError::Invalid(e) => e.fmt(f),
        }
    }
}

impl TryFrom<VerdictReply> for MarketingVerdict {
    type Error = VerdictError;

    fn try_from(r: VerdictReply) -> Result<Self, Self::Error> {
        if r.is_marketing_data {
            let analysis = r.analysis.ok_or(VerdictError::Missing("analysis"))?;
            serde_json::from_value(analysis)
                .map(MarketingVerdict::Marketing)
                .map_err(VerdictError::Invalid)
        } else {
            let reasoning = r.reasoning.ok_or(VerdictError::Missing("reasoning"))?;
            serde_json::from_value(reasoning)
                .map(|reasoning| MarketingVerdict::NotMarketing { reasoning })
                .map_err(VerdictError::Invalid)
        }
    }
}

/// Either result shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "data", rename_all = "snake_case")]
pub enum AnalysisResult {
    Insights(InsightReport),
    Verdict(MarketingVerdict),
}

/// What was analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: Option<u64>,
}

/// Accounting for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub duration_ms: u64,
    pub retries: u32,
    /// Whether the file bytes were attached to the request.
    pub content_sent: bool,
}

/// The full outcome of a successful analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub file: FileSummary,
    pub result: AnalysisResult,
    pub stats: AnalysisStats,
}
