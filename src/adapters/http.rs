//! HTTP 介面：接收表單 JSON，回傳三份紀錄與 base64 PDF

use crate::core::pipeline::ReportPipeline;
use crate::domain::model::{MarketingForm, ReportResponse};
use crate::domain::ports::{CompletionClient, DocumentRenderer};
use crate::utils::error::ReportError;
use crate::utils::validation::Validate;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const REPORT_ROUTE: &str = "/api/generate-report";
/// 舊前端仍呼叫 Netlify function 路徑
pub const LEGACY_REPORT_ROUTE: &str = "/.netlify/functions/generate-report";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

pub fn router<C, R>(pipeline: Arc<ReportPipeline<C, R>>) -> Router
where
    C: CompletionClient + 'static,
    R: DocumentRenderer + 'static,
{
    let generate = post(generate_report::<C, R>).fallback(method_not_allowed);

    Router::new()
        .route(REPORT_ROUTE, generate.clone())
        .route(LEGACY_REPORT_ROUTE, generate)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(pipeline)
}

async fn generate_report<C, R>(
    State(pipeline): State<Arc<ReportPipeline<C, R>>>,
    body: Bytes,
) -> Response
where
    C: CompletionClient + 'static,
    R: DocumentRenderer + 'static,
{
    let form = match parse_form(&body) {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!("Rejected report request: {}", e);
            return error_response(&e);
        }
    };

    match pipeline.run(&form).await {
        Ok(report) => (StatusCode::OK, Json(ReportResponse::from(&report))).into_response(),
        Err(e) => error_response(&e),
    }
}

fn parse_form(body: &[u8]) -> crate::utils::error::Result<MarketingForm> {
    let form = MarketingForm::from_json_slice(body)?;
    form.validate()?;
    Ok(form)
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody {
            error: "Method Not Allowed".to_string(),
        }),
    )
        .into_response()
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// 表單錯誤 → 400，其餘 (階段失敗、渲染失敗) → 500
pub fn error_response(err: &ReportError) -> Response {
    let status = match err {
        ReportError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}
