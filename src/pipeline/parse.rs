//! Response unwrapping and parsing: model text → typed result.
//!
//! Even when told "respond with JSON only", models without a response schema
//! often wrap their answer in a markdown code block (` ```json … ``` `). The
//! fence is stripped before decoding so fenced and bare replies parse to the
//! same value. With a schema the reply is already clean JSON and is decoded
//! as-is.
//!
//! Decoding is two-step so the two failure modes stay distinguishable:
//! text → `serde_json::Value` ([`AnalysisError::MalformedResponse`]), then
//! value → typed shape ([`AnalysisError::UnexpectedShape`]). Either error
//! carries a truncated preview of the raw text for diagnosis.

use crate::config::ResponseShape;
use crate::error::AnalysisError;
use crate::output::{AnalysisResult, InsightReport, MarketingVerdict, VerdictError, VerdictReply};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Maximum characters of raw response quoted in errors.
pub const PREVIEW_CHARS: usize = 300;

/// A fence wrapping the whole reply.
static RE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(\w*)?\s*\n?(.*?)\n?\s*```$").unwrap());

/// The first fenced block anywhere in the reply, for answers with prose around it.
static RE_FENCE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[\w-]*[ \t]*\r?\n(.*?)\r?\n[ \t]*```").unwrap());

/// Trim the reply and, unless it came from a schema-constrained call, strip
/// the code fence: one wrapping the whole reply, else the first embedded block.
pub fn unwrap_response(raw: &str, structured: bool) -> &str {
    let trimmed = raw.trim();
    if structured {
        return trimmed;
    }
    let body = RE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(2))
        .or_else(|| RE_FENCE_BLOCK.captures(trimmed).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str().trim());
    match body {
        Some(body) if !body.is_empty() => body,
        _ => trimmed,
    }
}

/// Parse a model reply into the requested shape.
pub fn parse_response(
    raw: &str,
    shape: ResponseShape,
    structured: bool,
) -> Result<AnalysisResult, AnalysisError> {
    let body = unwrap_response(raw, structured);

    let value: Value =
        serde_json::from_str(body).map_err(|e| AnalysisError::MalformedResponse {
            reason: e.to_string(),
            preview: preview(raw),
        })?;

    let shape_error = |e: serde_json::Error| AnalysisError::UnexpectedShape {
        reason: e.to_string(),
        preview: preview(raw),
    };

    match shape {
        ResponseShape::Insights => serde_json::from_value::<InsightReport>(value)
            .map(AnalysisResult::Insights)
            .map_err(shape_error),
        ResponseShape::MarketingVerdict => {
            let reply: VerdictReply = serde_json::from_value(value).map_err(shape_error)?;
            let is_marketing = reply.is_marketing_data;
            MarketingVerdict::try_from(reply)
                .map(AnalysisResult::Verdict)
                .map_err(|e| match e {
                    VerdictError::Missing(missing) => AnalysisError::IncompleteVerdict {
                        is_marketing,
                        missing,
                        preview: preview(raw),
                    },
                    VerdictError::Invalid(e) => shape_error(e),
                })
        }
    }
}

/// Truncate raw text for error messages, on a char boundary.
pub fn preview(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MarketingAnalysis;

    const VERDICT: &str = r#"{"isMarketingData": true, "analysis": {"conclusions": ["Search drives 60% of leads"], "suggestions": ["Shift budget to search"], "risks": [], "criticalErrors": ["Q2 total does not add up"]}}"#;

    #[test]
    fn strips_json_fence() {
        let fenced = format!("```json\n{VERDICT}\n```");
        assert_eq!(unwrap_response(&fenced, false), VERDICT);
    }

    #[test]
    fn strips_untagged_fence_and_whitespace() {
        let fenced = format!("  \n```\n  {VERDICT}  \n```\n\n");
        assert_eq!(unwrap_response(&fenced, false), VERDICT);
    }

    #[test]
    fn bare_json_passthrough() {
        assert_eq!(unwrap_response(&format!(" {VERDICT}\n"), false), VERDICT);
    }

    #[test]
    fn finds_fenced_block_inside_prose() {
        let reply = format!("Here is the result:\n```json\n{VERDICT}\n```\nLet me know if you need more.");
        assert_eq!(unwrap_response(&reply, false), VERDICT);
        let a = parse_response(&reply, ResponseShape::MarketingVerdict, false).unwrap();
        let b = parse_response(VERDICT, ResponseShape::MarketingVerdict, false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn structured_mode_does_not_strip() {
        let fenced = format!("```json\n{VERDICT}\n```");
        assert_eq!(unwrap_response(&fenced, true), fenced);
    }

    #[test]
    fn fenced_and_bare_parse_identically() {
        let fenced = format!("```json\n{VERDICT}\n```");
        let a = parse_response(&fenced, ResponseShape::MarketingVerdict, false).unwrap();
        let b = parse_response(VERDICT, ResponseShape::MarketingVerdict, false).unwrap();
        assert_eq!(a, b);
        match a {
            AnalysisResult::Verdict(MarketingVerdict::Marketing(MarketingAnalysis {
                conclusions,
                critical_errors,
                risks,
                ..
            })) => {
                assert_eq!(conclusions, vec!["Search drives 60% of leads"]);
                assert_eq!(critical_errors, vec!["Q2 total does not add up"]);
                assert!(risks.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_not_marketing() {
        let raw = r#"{"isMarketingData": false, "reasoning": "This is a payroll export."}"#;
        let r = parse_response(raw, ResponseShape::MarketingVerdict, true).unwrap();
        assert_eq!(
            r,
            AnalysisResult::Verdict(MarketingVerdict::NotMarketing {
                reasoning: "This is a payroll export.".into()
            })
        );
    }

    #[test]
    fn parses_insights_with_empty_lists() {
        let raw = "```json\n{\"insights\": [], \"recommendations\": [\"Test a new subject line\"]}\n```";
        match parse_response(raw, ResponseShape::Insights, false).unwrap() {
            AnalysisResult::Insights(r) => {
                assert!(r.insights.is_empty());
                assert_eq!(r.recommendations.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_json_is_malformed() {
        let raw = "Sure! Here is the analysis: insights are great";
        match parse_response(raw, ResponseShape::Insights, false) {
            Err(AnalysisError::MalformedResponse { preview, .. }) => assert_eq!(preview, raw),
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn non_array_field_is_shape_error() {
        let raw = r#"{"insights": "only one", "recommendations": []}"#;
        assert!(matches!(
            parse_response(raw, ResponseShape::Insights, true),
            Err(AnalysisError::UnexpectedShape { .. })
        ));

        let raw = r#"{"isMarketingData": true, "analysis": {"conclusions": {}, "suggestions": [], "risks": [], "criticalErrors": []}}"#;
        assert!(matches!(
            parse_response(raw, ResponseShape::MarketingVerdict, true),
            Err(AnalysisError::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn missing_required_field_is_shape_error() {
        let raw = r#"{"insights": ["a"]}"#;
        assert!(matches!(
            parse_response(raw, ResponseShape::Insights, true),
            Err(AnalysisError::UnexpectedShape { .. })
        ));
        let raw = r#"{"analysis": null}"#;
        assert!(matches!(
            parse_response(raw, ResponseShape::MarketingVerdict, true),
            Err(AnalysisError::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn top_level_array_is_shape_error() {
        assert!(matches!(
            parse_response("[1, 2]", ResponseShape::Insights, true),
            Err(AnalysisError::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn flag_without_payload_is_incomplete() {
        match parse_response(r#"{"isMarketingData": true}"#, ResponseShape::MarketingVerdict, true) {
            Err(AnalysisError::IncompleteVerdict {
                is_marketing,
                missing,
                ..
            }) => {
                assert!(is_marketing);
                assert_eq!(missing, "analysis");
            }
            other => panic!("expected IncompleteVerdict, got {other:?}"),
        }
        match parse_response(r#"{"isMarketingData": false}"#, ResponseShape::MarketingVerdict, true) {
            Err(AnalysisError::IncompleteVerdict { missing, .. }) => assert_eq!(missing, "reasoning"),
            other => panic!("expected IncompleteVerdict, got {other:?}"),
        }
    }

    #[test]
    fn opposite_branch_is_not_decoded() {
        let raw = r#"{"isMarketingData": false, "reasoning": "Payroll", "analysis": {}}"#;
        assert_eq!(
            parse_response(raw, ResponseShape::MarketingVerdict, true).unwrap(),
            AnalysisResult::Verdict(MarketingVerdict::NotMarketing {
                reasoning: "Payroll".into()
            })
        );

        let raw = r#"{"isMarketingData": false, "reasoning": ["not", "a", "string"]}"#;
        assert!(matches!(
            parse_response(raw, ResponseShape::MarketingVerdict, true),
            Err(AnalysisError::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "ż".repeat(PREVIEW_CHARS + 50);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 1);
        assert!(p.ends_with('…'));
        assert_eq!(preview("  short  "), "short");
    }
}
