// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use easel::{detect_mark, AnalysisResult, ChartRecommender, EaselError};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
pub const DEFAULT_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:5175",
];
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;
#[derive(Clone)]
pub struct AppState {
    recommender: Arc<ChartRecommender>,
    preview_rows: usize,
}
impl AppState {
    pub fn new(recommender: ChartRecommender, preview_rows: usize) -> Self {
        Self {
            recommender: Arc::new(recommender),
            preview_rows,
        }
    }
}
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unprocessable(String),
    Internal(String),
}
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}
impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("analysis task failed: {err}"))
    }
}
#[derive(Serialize)]
struct DataAnalysisResponse {
    #[serde(flatten)]
    analysis: AnalysisResult,
    preview: Vec<Map<String, Value>>,
}
struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?.to_vec();
        return Ok(Upload { file_name, bytes });
    }
    Err(ApiError::BadRequest("missing multipart field 'file'".to_string()))
}
/// A `*` entry opens the API to any origin; credentials are then disabled,
/// since browsers reject credentialed wildcard responses.
fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    if origins.iter().any(|origin| origin.as_bytes() == b"*") {
        warn!("wildcard CORS origin configured, credentials disabled");
        return CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods(Any)
            .allow_headers(Any);
    }
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
pub fn build_router(state: AppState, origins: Vec<HeaderValue>, body_limit: usize) -> Router {
    let cors = cors_layer(origins);
    Router::new()
        .route("/health", get(health))
        .route("/analyze-data", post(analyze_data))
        .route("/analyze-image", post(analyze_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
async fn analyze_data(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    let name = upload.file_name.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let config = state.recommender.config();
        let dataset = easel::ingest::load_bytes(&upload.file_name, upload.bytes, &config.loader)
            .map_err(EaselError::from)?;
        Ok::<_, EaselError>(DataAnalysisResponse {
            analysis: state.recommender.analyze(&dataset),
            preview: dataset.preview_records(state.preview_rows),
        })
    })
    .await?;
    match outcome {
        Ok(body) => {
            info!(file = %name, recommended = body.analysis.recommendations.len(), "data analysed");
            Ok(Json(body).into_response())
        }
        Err(err) if err.is_unsupported_format() => {
            warn!(file = %name, "unsupported upload format");
            Ok(Json(json!({ "error": err.user_message() })).into_response())
        }
        Err(err) => Err(ApiError::Unprocessable(err.user_message())),
    }
}
async fn analyze_image(multipart: Multipart) -> Result<Json<Value>, ApiError> {
    let upload = read_upload(multipart).await?;
    let mark = tokio::task::spawn_blocking(move || detect_mark(&upload.bytes)).await?;
    info!(file = %upload.file_name, %mark, "image analysed");
    Ok(Json(json!({
        "filename": upload.file_name,
        "detected_type": mark,
        "message": format!("Successfully analyzed image. Detected style: {mark}"),
    })))
}
