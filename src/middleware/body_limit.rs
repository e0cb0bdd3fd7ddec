//! 请求体大小限制
//!
//! 在任何处理器运行之前拒绝超出配置上限的请求体，返回 413。

use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::server::{ApiError, AppState};

/// 从 `Content-Length` 判断是否超限
fn declared_too_large(request: &Request, limit: usize) -> bool {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .is_some_and(|len| len > limit)
}

/// 请求体限制中间件
///
/// 先检查声明的长度，再在读取时按上限截断，两种超限都返回同样的 413。
pub async fn limit_body(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limit = state.body_limit;
    let too_large = || {
        tracing::warn!("[LIMIT] 请求体超过上限 {}", state.config.body_limit);
        ApiError::PayloadTooLarge {
            limit: state.config.body_limit.clone(),
        }
        .into_response()
    };

    if declared_too_large(&request, limit) {
        return too_large();
    }

    let (parts, body) = request.into_parts();
    match body::to_bytes(body, limit).await {
        Ok(bytes) => next.run(Request::from_parts(parts, Body::from(bytes))).await,
        Err(_) => too_large(),
    }
}
