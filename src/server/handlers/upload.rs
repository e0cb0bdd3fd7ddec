//! POST /api/upload-token
//!
//! 接收任意 JSON 凭证并写入本地凭证文件，供上游后端读取。

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::logger::sanitize_log_message;
use crate::server::{ApiError, AppState};

pub async fn upload_token(State(state): State<AppState>, body: Bytes) -> Response {
    let credential: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                "[UPLOAD] 凭证不是合法的 JSON: {}",
                sanitize_log_message(&String::from_utf8_lossy(&body))
            );
            return ApiError::BadRequest(format!("凭证不是合法的 JSON: {}", e)).into_response();
        }
    };

    match state.credentials.save(&credential).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => {
            tracing::error!("[UPLOAD] 保存凭证失败: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
