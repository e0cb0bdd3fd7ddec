//! HTTP 错误响应
//!
//! 所有错误都以 `{"error": "<message>"}` 返回。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::backends::BackendError;
use crate::translator::TranslateError;

/// 网关错误
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid API Key")]
    Unauthorized,

    #[error("请求体过大，最大允许 {limit}")]
    PayloadTooLarge { limit: String },

    #[error("{}", .0.message)]
    Backend(BackendError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Backend(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TranslateError> for ApiError {
    fn from(err: TranslateError) -> Self {
        Self::BadRequest(err.message)
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[SERVER] 请求失败: {}", self);
        }
        (
            status,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
