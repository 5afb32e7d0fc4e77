use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use base64::Engine;
use marketing_audit::adapters::http;
use marketing_audit::domain::model::{BusinessAnalysis, FormattedReport, MarketingStrategy};
use marketing_audit::domain::ports::{CompletionClient, CompletionRequest};
use marketing_audit::utils::error::CompletionError;
use marketing_audit::{PdfRenderer, PipelineSettings, ReportPipeline, ReportResponse};
use std::sync::Arc;
use tower::ServiceExt;

const FORM: &str = include_str!("fixtures/marketing_form.json");
const ANALYSIS: &str = include_str!("fixtures/business_analysis.json");
const STRATEGY: &str = include_str!("fixtures/marketing_strategy.json");
const REPORT: &str = include_str!("fixtures/formatted_report.json");

/// 依 max_tokens 判斷階段並回傳固定內容
#[derive(Default)]
struct FixtureClient {
    fail_formatting: bool,
}

#[async_trait]
impl CompletionClient for FixtureClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        match request.max_tokens {
            2000 => Ok(ANALYSIS.to_string()),
            2500 => Ok(STRATEGY.to_string()),
            _ if self.fail_formatting => Err(CompletionError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            }),
            _ => Ok(REPORT.to_string()),
        }
    }
}

fn app(client: FixtureClient) -> axum::Router {
    let pipeline = ReportPipeline::new(client, PdfRenderer::new(), PipelineSettings::new("test"));
    http::router(Arc::new(pipeline))
}

async fn send(app: axum::Router, method: &str, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_generate_report_returns_records_and_pdf() {
    let (status, body) = send(app(FixtureClient::default()), "POST", http::REPORT_ROUTE, FORM).await;

    assert_eq!(status, StatusCode::OK);
    let response: ReportResponse = serde_json::from_value(body).unwrap();
    let analysis: BusinessAnalysis = serde_json::from_str(ANALYSIS).unwrap();
    let strategy: MarketingStrategy = serde_json::from_str(STRATEGY).unwrap();
    let report: FormattedReport = serde_json::from_str(REPORT).unwrap();
    assert_eq!(response.business_analysis, analysis);
    assert_eq!(response.strategy, strategy);
    assert_eq!(response.report, report);

    let pdf = base64::engine::general_purpose::STANDARD
        .decode(response.pdf.unwrap())
        .unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_legacy_route_is_served() {
    let (status, body) = send(
        app(FixtureClient::default()),
        "POST",
        http::LEGACY_REPORT_ROUTE,
        FORM,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("businessAnalysis").is_some());
    assert!(body.get("pdf").and_then(|p| p.as_str()).is_some());
}

#[tokio::test]
async fn test_non_post_is_method_not_allowed() {
    for method in ["GET", "PUT", "DELETE"] {
        let (status, body) = send(app(FixtureClient::default()), method, http::REPORT_ROUTE, "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{}", method);
        assert_eq!(body["error"], "Method Not Allowed");
    }
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    for body in ["{not json", "[]", r#"{"companyType": "B2B"}"#] {
        let client = FixtureClient::default();
        let (status, json) = send(app(client), "POST", http::REPORT_ROUTE, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert!(json["error"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_stage_failure_is_internal_error() {
    let client = FixtureClient {
        fail_formatting: true,
        ..Default::default()
    };
    let (status, body) = send(app(client), "POST", http::REPORT_ROUTE, FORM).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Stage 3"), "{}", error);
    assert!(body.get("pdf").is_none());
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(FixtureClient::default()), "GET", "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
