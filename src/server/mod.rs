//! HTTP surface of the analysis service.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `POST /api/analyze` | classify an image and store the result |
//! | `GET /api/results?user_id=` | newest analyses of a user |
//! | `GET /api/stats/{user_id}` | total, monthly and weekly counts |
//! | `GET /api/health` | run the probe image through the pipeline |

pub mod error;
pub mod handlers;
pub mod schema;

pub use error::ApiError;

use crate::core::errors::{AnalysisError, AnalysisResult};
use crate::pipeline::AppContext;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Largest accepted request body. Base64 microscopy images run to several
/// megabytes, well past axum's default.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Builds the router over a shared context.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/results", get(handlers::results))
        .route("/api/stats/{user_id}", get(handlers::stats))
        .route("/api/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Serves the API on `addr` until Ctrl-C.
pub async fn serve(ctx: AppContext, addr: SocketAddr) -> AnalysisResult<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AnalysisError::from)?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
