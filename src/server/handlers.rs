//! Route handlers.
//!
//! Inference and store calls block, so each handler moves its work onto the
//! blocking pool and keeps the async workers free.

use super::error::ApiError;
use super::schema::{
    AnalyzeRequest, AnalyzeResponse, HealthResponse, ResultsQuery, ResultsResponse, StatsResponse,
};
use crate::core::errors::AnalysisResult;
use crate::pipeline::AppContext;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::warn;

async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> AnalysisResult<T> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}

pub async fn analyze(
    State(ctx): State<AppContext>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(body) = body?;
    let request = body.validate()?;

    let outcome = blocking(move || ctx.analyze(&request.image, &request.user_id, &request.notes))
        .await?;
    Ok(Json(outcome.into()))
}

pub async fn results(
    State(ctx): State<AppContext>,
    query: Result<Query<ResultsQuery>, QueryRejection>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let Query(query) = query?;
    let user_id = query.validate()?;

    let analyses = blocking(move || ctx.results_for(&user_id)).await?;
    Ok(Json(ResultsResponse { analyses }))
}

pub async fn stats(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = blocking(move || ctx.stats_for(&user_id, Utc::now())).await?;
    Ok(Json(stats.into()))
}

pub async fn health(State(ctx): State<AppContext>) -> Response {
    match blocking(move || ctx.health()).await {
        Ok(report) => Json(HealthResponse {
            status: "healthy",
            model_loaded: true,
            device: Some(report.device),
            test_prediction_status: Some("success"),
            metrics: Some(report.metrics),
            error: None,
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "health probe failed");
            let body = HealthResponse {
                status: "unhealthy",
                model_loaded: true,
                device: None,
                test_prediction_status: Some("error"),
                metrics: None,
                error: Some(e.to_string()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
