//! Structured-output schemas.
//!
//! When [`crate::config::AnalysisConfig::structured_output`] is on, one of
//! these schemas is sent as `responseSchema` and the model is constrained to
//! emit JSON of exactly that layout. Types use the provider's OpenAPI subset
//! (`OBJECT`, `ARRAY`, `STRING`, `BOOLEAN`).

use crate::config::ResponseShape;
use serde_json::{json, Value};

/// The schema matching a response shape.
pub fn response_schema(shape: ResponseShape) -> Value {
    match shape {
        ResponseShape::Insights => insights_schema(),
        ResponseShape::MarketingVerdict => verdict_schema(),
    }
}

fn string_list(description: &str) -> Value {
    json!({
        "type": "ARRAY",
        "description": description,
        "items": { "type": "STRING" }
    })
}

fn insights_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "insights": string_list("Key observations about the document"),
            "recommendations": string_list("Actionable recommendations")
        },
        "required": ["insights", "recommendations"],
        "propertyOrdering": ["insights", "recommendations"]
    })
}

fn verdict_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isMarketingData": {
                "type": "BOOLEAN",
                "description": "Whether the document contains marketing data"
            },
            "analysis": {
                "type": "OBJECT",
                "description": "Present only when isMarketingData is true",
                "properties": {
                    "conclusions": string_list("Key conclusions"),
                    "suggestions": string_list("Improvement suggestions"),
                    "risks": string_list("Risks to monitor"),
                    "criticalErrors": string_list("Critical errors found in the data")
                },
                "required": ["conclusions", "suggestions", "risks", "criticalErrors"],
                "propertyOrdering": ["conclusions", "suggestions", "risks", "criticalErrors"]
            },
            "reasoning": {
                "type": "STRING",
                "description": "Present only when isMarketingData is false"
            }
        },
        "required": ["isMarketingData"],
        "propertyOrdering": ["isMarketingData", "analysis", "reasoning"]
    })
}
