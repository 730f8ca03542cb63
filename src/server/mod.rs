//! HTTP surface: health, download and file serving routes.

mod error;
mod files;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::downloader::DownloadResult;
use crate::retrieval::Retriever;

pub use error::ApiError;
pub use files::serve_file;

/// Implementation tag reported by `/health`
pub const BACKEND_TAG: &str = "rust-axum";

pub struct AppState {
    pub retriever: Retriever,
}

impl AppState {
    pub fn new(retriever: Retriever) -> Self {
        Self { retriever }
    }
}

#[derive(Debug, Default, Deserialize)]
struct DownloadRequest {
    #[serde(default)]
    url: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/download", post(download))
        .route("/serve/{filename}", get(serve_file))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "active", "backend": BACKEND_TAG}))
}

/// Body is parsed by hand so a malformed or non-object body reads as a
/// missing URL instead of axum's own rejection.
async fn download(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<DownloadResult>, ApiError> {
    let url = requested_url(&body).ok_or_else(ApiError::missing_url)?;
    info!(url, "download requested");

    let result = state.retriever.retrieve(&url).await?;
    Ok(Json(result))
}

fn requested_url(body: &[u8]) -> Option<String> {
    let request: DownloadRequest = serde_json::from_slice(body).ok()?;
    request
        .url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}
