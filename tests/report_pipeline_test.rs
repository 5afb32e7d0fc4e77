use base64::Engine;
use httpmock::prelude::*;
use marketing_audit::domain::model::{BusinessAnalysis, FormattedReport, MarketingStrategy, Stage};
use marketing_audit::utils::error::CompletionError;
use marketing_audit::{
    LocalStorage, MarketingForm, OpenAiClient, PdfRenderer, PipelineRun, PipelineSettings,
    PipelineState, ReportError, ReportPipeline, ReportResponse,
};
use serde_json::json;
use tempfile::TempDir;

const FORM: &str = include_str!("fixtures/marketing_form.json");
const ANALYSIS: &str = include_str!("fixtures/business_analysis.json");
const STRATEGY: &str = include_str!("fixtures/marketing_strategy.json");
const REPORT: &str = include_str!("fixtures/formatted_report.json");

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

fn pipeline(server: &MockServer) -> ReportPipeline<OpenAiClient, PdfRenderer> {
    ReportPipeline::new(
        OpenAiClient::new(server.url("/v1"), "sk-test"),
        PdfRenderer::new(),
        PipelineSettings::new("gpt-4-turbo-preview"),
    )
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

#[tokio::test]
async fn test_end_to_end_report_with_mock_completion_service() {
    let server = MockServer::start();

    // 各階段以 max_tokens 區分
    let analysis_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer sk-test")
            .json_body_partial(r#"{"max_tokens": 2000}"#)
            .body_contains("Company Type: B2B");
        then.status(200).json_body(completion(ANALYSIS));
    });
    let strategy_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .json_body_partial(r#"{"max_tokens": 2500}"#)
            .body_contains("Emerging challenger in the mid-market IT tooling segment");
        then.status(200).json_body(completion(STRATEGY));
    });
    let report_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .json_body_partial(r#"{"max_tokens": 3000}"#);
        then.status(200)
            .json_body(completion(&format!("```json\n{}\n```", REPORT)));
    });

    let form = MarketingForm::from_json_slice(FORM.as_bytes()).unwrap();
    let mut run = PipelineRun::new();
    let generated = pipeline(&server).execute(&form, &mut run).await.unwrap();

    analysis_mock.assert();
    strategy_mock.assert();
    report_mock.assert();
    assert_eq!(run.state(), PipelineState::Done);

    let expected_analysis: BusinessAnalysis = serde_json::from_str(ANALYSIS).unwrap();
    let expected_strategy: MarketingStrategy = serde_json::from_str(STRATEGY).unwrap();
    let expected_report: FormattedReport = serde_json::from_str(REPORT).unwrap();
    assert_eq!(generated.business_analysis, expected_analysis);
    assert_eq!(generated.strategy, expected_strategy);
    assert_eq!(generated.report, expected_report);

    let response = ReportResponse::from(&generated);
    let pdf = base64::engine::general_purpose::STANDARD
        .decode(response.pdf.as_deref().unwrap())
        .unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    for section in &expected_report.sections {
        assert!(contains(&pdf, &section.title), "PDF is missing {}", section.title);
    }
    assert_eq!(generated.document.sections.len(), expected_report.sections.len());
}

#[tokio::test]
async fn test_strategy_failure_skips_formatting() {
    let server = MockServer::start();

    let analysis_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .json_body_partial(r#"{"max_tokens": 2000}"#);
        then.status(200).json_body(completion(ANALYSIS));
    });
    let strategy_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .json_body_partial(r#"{"max_tokens": 2500}"#);
        then.status(500).body("upstream overloaded");
    });
    let report_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .json_body_partial(r#"{"max_tokens": 3000}"#);
        then.status(200).json_body(completion(REPORT));
    });

    let form = MarketingForm::from_json_slice(FORM.as_bytes()).unwrap();
    let err = pipeline(&server).run(&form).await.unwrap_err();

    analysis_mock.assert_hits(1);
    strategy_mock.assert_hits(1);
    report_mock.assert_hits(0);

    assert_eq!(err.stage(), Some(Stage::StrategyDevelopment));
    match err {
        ReportError::Completion {
            source: CompletionError::Status { status, .. },
            ..
        } => assert_eq!(status, 500),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_model_prose_is_a_validation_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .json_body(completion("Here is my analysis: the company is doing well."));
    });

    let form = MarketingForm::from_json_slice(FORM.as_bytes()).unwrap();
    let err = pipeline(&server).run(&form).await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::BusinessAnalysis));
    assert!(matches!(err, ReportError::Validation { .. }));
}

#[tokio::test]
async fn test_generated_report_is_saved_to_disk() {
    let server = MockServer::start();
    for (max_tokens, body) in [(2000, ANALYSIS), (2500, STRATEGY), (3000, REPORT)] {
        server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .json_body_partial(json!({ "max_tokens": max_tokens }).to_string());
            then.status(200).json_body(completion(body));
        });
    }

    let form = MarketingForm::from_json_slice(FORM.as_bytes()).unwrap();
    let generated = pipeline(&server).run(&form).await.unwrap();

    let temp_dir = TempDir::new().unwrap();
    let saved = LocalStorage::new(temp_dir.path())
        .save_report(&generated, "20260101_000000")
        .unwrap();

    let pdf = std::fs::read(&saved.pdf_path).unwrap();
    assert_eq!(pdf, generated.document.bytes);

    let saved_json: ReportResponse =
        serde_json::from_slice(&std::fs::read(&saved.json_path).unwrap()).unwrap();
    assert_eq!(saved_json.report, generated.report);
    assert!(saved_json.pdf.is_none());
}
