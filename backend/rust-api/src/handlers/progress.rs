use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::ProgressError;
use crate::services::{progress_service::ProgressService, AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateLevelParams {
    pub score: u32,
    #[serde(default)]
    pub completed: bool,
}

pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!("Fetching progress for user_id={}", user_id);

    let service = ProgressService::new(state.store.clone());

    match service.get_progress(&user_id).await {
        Ok(record) => Ok((StatusCode::OK, Json(record))),
        Err(e) => {
            tracing::error!("Failed to fetch progress: {}", e);
            Err(error_response(e))
        }
    }
}

pub async fn update_level_progress(
    State(state): State<Arc<AppState>>,
    Path((user_id, level)): Path<(String, String)>,
    Query(params): Query<UpdateLevelParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!(
        "Updating progress for user_id={}, level={}, score={}, completed={}",
        user_id,
        level,
        params.score,
        params.completed
    );

    let service = ProgressService::new(state.store.clone());

    match service
        .update_level(&user_id, &level, params.score, params.completed)
        .await
    {
        Ok(record) => Ok((StatusCode::OK, Json(record))),
        Err(e) => {
            tracing::error!("Failed to update progress: {}", e);
            Err(error_response(e))
        }
    }
}

pub async fn get_current_level(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!("Fetching current level for user_id={}", user_id);

    let service = ProgressService::new(state.store.clone());

    match service.current_level(&user_id).await {
        Ok(level) => Ok((
            StatusCode::OK,
            Json(json!({ "current_level": level.as_str() })),
        )),
        Err(e) => {
            tracing::error!("Failed to fetch current level: {}", e);
            Err(error_response(e))
        }
    }
}

/// Maps the error taxonomy onto response codes. Message text is forwarded
/// as-is, matching the upstream API behavior.
fn error_response(e: ProgressError) -> (StatusCode, String) {
    let status = match &e {
        ProgressError::InvalidLevel(_) => StatusCode::BAD_REQUEST,
        ProgressError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ProgressError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}
