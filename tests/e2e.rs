//! Live tests against the real Gemini API.
//!
//! Gated behind `E2E_ENABLED` and a configured key so they never run in CI
//! unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture

use doc_insights::{
    analyze_bytes, AnalysisConfig, AnalysisResult, Language, MarketingVerdict, PromptPolicy,
    ResponseShape,
};

/// Skip unless E2E_ENABLED is set and a key is available.
macro_rules! e2e_skip_unless_ready {
    ($config:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if $config.resolve_api_key().is_none() {
            println!("SKIP: GEMINI_API_KEY is not set");
            return;
        }
    }};
}

const CAMPAIGN_CSV: &[u8] = b"channel,week,impressions,clicks,spend_usd,leads\n\
search,1,120000,3600,1800,95\n\
search,2,118000,3900,1750,110\n\
social,1,300000,2100,2200,40\n\
social,2,310000,1900,2300,31\n\
email,1,45000,2700,150,88\n\
email,2,47000,2950,155,97\n";

const TIMESHEET_CSV: &[u8] = b"employee,date,hours,project\n\
A. Nowak,2024-03-04,8,ERP migration\n\
B. Kowalska,2024-03-04,7.5,ERP migration\n\
A. Nowak,2024-03-05,8,Support\n";

#[tokio::test]
async fn campaign_export_is_marketing() {
    let config = AnalysisConfig::default();
    e2e_skip_unless_ready!(config);

    let output = analyze_bytes("campaign_weekly.csv", "text/csv", CAMPAIGN_CSV, &config)
        .await
        .expect("analysis should succeed");
    println!("{}", serde_json::to_string_pretty(&output).unwrap());

    match output.result {
        AnalysisResult::Verdict(MarketingVerdict::Marketing(ref a)) => {
            assert!(!a.is_empty(), "expected at least one finding");
        }
        ref other => panic!("expected a marketing verdict, got {other:?}"),
    }
}

#[tokio::test]
async fn timesheet_is_not_marketing() {
    let config = AnalysisConfig::default();
    e2e_skip_unless_ready!(config);

    let output = analyze_bytes("timesheet_march.csv", "text/csv", TIMESHEET_CSV, &config)
        .await
        .expect("analysis should succeed");

    match output.result {
        AnalysisResult::Verdict(MarketingVerdict::NotMarketing { ref reasoning }) => {
            assert!(!reasoning.trim().is_empty());
        }
        ref other => panic!("expected a non-marketing verdict, got {other:?}"),
    }
}

#[tokio::test]
async fn polish_insights_from_file_name() {
    let config = AnalysisConfig::builder()
        .language(Language::Polish)
        .shape(ResponseShape::Insights)
        .policy(PromptPolicy::FilenameOnly)
        .build()
        .unwrap();
    e2e_skip_unless_ready!(config);

    let output = analyze_bytes("kampania_q3_wyniki.xlsx", "", Vec::<u8>::new(), &config)
        .await
        .expect("analysis should succeed");
    assert!(matches!(output.result, AnalysisResult::Insights(_)));
    assert!(!output.stats.content_sent);
}
