//! POST /v1/chat/completions

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{Stream, StreamExt};

use crate::logger::sanitize_log_message;
use crate::server::{ApiError, AppState};
use crate::stream::{collect_response, commit_sse_stream, drive_backend, ResponseEnvelope};
use crate::translator::{OpenAiRequestTranslator, RequestTranslator};

/// Chat Completions
///
/// 校验失败时不会调用后端。信封在调用后端之前计算。
pub async fn chat_completions(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let translated = OpenAiRequestTranslator::new()
        .translate_request(body)
        .inspect_err(|e| tracing::warn!("[CHAT] 请求校验失败: {}", e))?;

    let envelope = ResponseEnvelope::new(translated.model.clone());
    tracing::info!(
        "[CHAT] 收到请求: id={}, model={:?}, stream={}, backend={}",
        envelope.id,
        envelope.model,
        translated.stream,
        state.backend.name()
    );

    if tracing::enabled!(tracing::Level::DEBUG) {
        let body = serde_json::to_string(translated.backend_request.as_map()).unwrap_or_default();
        tracing::debug!("[CHAT] 后端请求: {}", sanitize_log_message(&body));
    }

    let events = drive_backend(state.backend.clone(), translated.backend_request);

    if translated.stream {
        let frames = commit_sse_stream(events, envelope).await;
        Ok(build_sse_response(frames))
    } else {
        let response = collect_response(events, &envelope).await?;
        Ok(Json(response).into_response())
    }
}

/// 构建 SSE 响应
pub fn build_sse_response<S>(frames: S) -> Response
where
    S: Stream<Item = String> + Send + 'static,
{
    let body_stream = frames.map(|frame| Ok::<_, std::io::Error>(Bytes::from(frame)));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(body_stream))
        .unwrap_or_else(|_| {
            ApiError::Internal("Failed to build streaming response".to_string()).into_response()
        })
}
