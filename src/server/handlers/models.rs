//! GET /v1/models

use axum::{extract::State, Json};

use crate::models::openai::ModelList;
use crate::server::{ApiError, AppState};

/// 模型列表，直接取自后端
pub async fn models(State(state): State<AppState>) -> Result<Json<ModelList>, ApiError> {
    let models = state.backend.list_models().await?;
    tracing::debug!("[MODELS] 后端 {} 返回 {} 个模型", state.backend.name(), models.len());
    Ok(Json(ModelList::new(models)))
}
