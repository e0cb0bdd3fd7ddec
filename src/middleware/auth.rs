//! API Key 认证
//!
//! `/v1/` 前缀的路径在配置了 API Key 时需要认证，支持
//! `Authorization: Bearer <key>` 或直接携带 key。

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::server::{ApiError, AppState};

/// 需要认证的路径前缀
pub const PROTECTED_PREFIX: &str = "/v1/";

/// 从请求头中提取 key
pub fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    Some(value.strip_prefix("Bearer ").map(str::trim).unwrap_or(value))
}

/// 常量时间比较
pub fn verify_api_key(expected: &str, provided: Option<&str>) -> bool {
    match provided {
        Some(key) => key.as_bytes().ct_eq(expected.as_bytes()).into(),
        None => false,
    }
}

/// 认证中间件
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.api_key() else {
        return next.run(request).await;
    };
    if !request.uri().path().starts_with(PROTECTED_PREFIX) {
        return next.run(request).await;
    }

    if verify_api_key(expected, extract_api_key(request.headers())) {
        next.run(request).await
    } else {
        tracing::warn!("[AUTH] API Key 校验失败: {}", request.uri().path());
        ApiError::Unauthorized.into_response()
    }
}
