//! 桥接层属性测试
//!
//! 使用 proptest 生成任意 chunk 序列，用脚本化后端驱动完整管道。

use crate::backends::{AssistantBackend, BackendRequest, ScriptStep, ScriptedBackend};
use crate::models::openai::{FunctionDelta, ToolCallDelta};
use crate::stream::{
    collect_response, commit_sse_stream, drive_backend, BackendChunk, BridgeEvent,
    ResponseEnvelope, DONE_FRAME, ERROR_MARKER,
};
use futures::StreamExt;
use proptest::prelude::*;
use serde_json::{Map, Value};
use std::sync::Arc;

fn request() -> BackendRequest {
    let mut body = Map::new();
    body.insert("messages".to_string(), serde_json::json!([]));
    BackendRequest::from_map(body)
}

fn tool_call(name: &str) -> ToolCallDelta {
    ToolCallDelta {
        index: Some(0),
        id: Some(format!("call_{}", name)),
        call_type: Some("function".to_string()),
        function: Some(FunctionDelta {
            name: Some(name.to_string()),
            arguments: Some("{}".to_string()),
        }),
    }
}

/// 生成随机 chunk
fn arb_chunk() -> impl Strategy<Value = BackendChunk> {
    prop_oneof![
        3 => "[a-zA-Z0-9 你好]{0,12}".prop_map(BackendChunk::content),
        1 => prop::collection::vec("[a-z_]{1,8}", 0..3)
            .prop_map(|names| BackendChunk::tool_calls(names.iter().map(|n| tool_call(n)).collect())),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn run_sse(backend: ScriptedBackend, envelope: ResponseEnvelope) -> Vec<String> {
    let backend: Arc<dyn AssistantBackend> = Arc::new(backend);
    let events = drive_backend(backend, request());
    commit_sse_stream(events, envelope).await.collect().await
}

fn frame_json(frame: &str) -> Value {
    let payload = frame
        .strip_prefix("data: ")
        .and_then(|s| s.strip_suffix("\n\n"))
        .unwrap();
    serde_json::from_str(payload).unwrap()
}

fn scripted(chunks: &[BackendChunk]) -> ScriptedBackend {
    ScriptedBackend::new(chunks.iter().cloned().map(ScriptStep::Chunk).collect())
}

proptest! {
    /// 同一请求的所有帧共享 id / created / model
    #[test]
    fn prop_envelope_stable_across_frames(chunks in prop::collection::vec(arb_chunk(), 0..8)) {
        let envelope = ResponseEnvelope::new(Some(Value::from("m")));
        let frames = runtime().block_on(run_sse(scripted(&chunks), envelope.clone()));

        for frame in &frames[..frames.len() - 1] {
            let json = frame_json(frame);
            prop_assert_eq!(json["id"].as_str(), Some(envelope.id.as_str()));
            prop_assert_eq!(json["created"].as_i64(), Some(envelope.created));
            prop_assert_eq!(json["model"].as_str(), Some("m"));
            prop_assert_eq!(json["object"].as_str(), Some("chat.completion.chunk"));
        }
    }

    /// 每个 chunk 恰好一帧，最后两帧依次是结束帧和 [DONE]
    #[test]
    fn prop_frames_end_with_closing_then_done(chunks in prop::collection::vec(arb_chunk(), 0..8)) {
        let frames = runtime().block_on(run_sse(scripted(&chunks), ResponseEnvelope::new(None)));

        prop_assert_eq!(frames.len(), chunks.len() + 2);
        prop_assert_eq!(frames.last().map(String::as_str), Some(DONE_FRAME));

        let closing = frame_json(&frames[frames.len() - 2]);
        prop_assert_eq!(&closing["choices"][0]["delta"], &serde_json::json!({}));

        let expected = if chunks.iter().any(BackendChunk::is_tool_calls) {
            "tool_calls"
        } else {
            "stop"
        };
        prop_assert_eq!(closing["choices"][0]["finish_reason"].as_str(), Some(expected));
    }

    /// 工具调用帧和文本帧互不混合
    #[test]
    fn prop_tool_calls_never_share_frame_with_content(
        chunks in prop::collection::vec(arb_chunk(), 1..8)
    ) {
        let frames = runtime().block_on(run_sse(scripted(&chunks), ResponseEnvelope::new(None)));

        for (chunk, frame) in chunks.iter().zip(&frames) {
            let delta = &frame_json(frame)["choices"][0]["delta"];
            prop_assert_eq!(delta.get("tool_calls").is_some(), chunk.is_tool_calls());
            prop_assert_eq!(delta.get("content").is_some(), !chunk.is_tool_calls());
            prop_assert!(frame_json(frame)["choices"][0]["finish_reason"].is_null());
        }
    }

    /// 非流式响应：文本按顺序拼接，工具调用取最后一次
    #[test]
    fn prop_buffered_response_concatenates(chunks in prop::collection::vec(arb_chunk(), 0..8)) {
        let envelope = ResponseEnvelope::new(Some(Value::from("m")));
        let response = runtime()
            .block_on(async {
                let backend: Arc<dyn AssistantBackend> = Arc::new(scripted(&chunks));
                collect_response(drive_backend(backend, request()), &envelope).await
            })
            .unwrap();

        let expected: String = chunks
            .iter()
            .filter_map(|c| match c {
                BackendChunk::Content { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        let last_calls = chunks.iter().rev().find_map(|c| match c {
            BackendChunk::ToolCalls { calls } => Some(calls.clone()),
            _ => None,
        });

        let choice = &response.choices[0];
        prop_assert_eq!(&choice.message.content, &expected);
        prop_assert_eq!(
            choice.message.tool_calls.clone(),
            last_calls.clone().filter(|c| !c.is_empty())
        );
        prop_assert_eq!(
            choice.finish_reason.as_str(),
            if last_calls.is_some() { "tool_calls" } else { "stop" }
        );
        prop_assert_eq!(&response.id, &envelope.id);
    }
}

#[tokio::test]
async fn test_events_preserve_order_and_finish_last() {
    let backend: Arc<dyn AssistantBackend> = Arc::new(ScriptedBackend::from_texts(["a", "b", "c"]));
    let events: Vec<BridgeEvent> = drive_backend(backend, request()).collect().await;

    assert_eq!(events.len(), 4);
    for (event, text) in events.iter().zip(["a", "b", "c"]) {
        assert!(matches!(event, BridgeEvent::Chunk(c) if *c == BackendChunk::content(text)));
    }
    assert!(matches!(events[3], BridgeEvent::Finished(Ok(()))));
}

#[tokio::test]
async fn test_failure_before_output_emits_error_frames() {
    let backend = ScriptedBackend::new(vec![ScriptStep::Fail("上游不可用".to_string())]);
    let envelope = ResponseEnvelope::new(Some(Value::from("m")));
    let frames = run_sse(backend, envelope.clone()).await;

    assert_eq!(frames.len(), 3);
    let error = frame_json(&frames[0]);
    assert_eq!(
        error["choices"][0]["delta"]["content"],
        format!("{} 上游不可用", ERROR_MARKER)
    );
    assert_eq!(error["id"], envelope.id.as_str());

    let closing = frame_json(&frames[1]);
    assert_eq!(closing["choices"][0]["finish_reason"], "stop");
    assert_eq!(closing["created"], envelope.created);
    assert_eq!(frames[2], DONE_FRAME);
}

#[tokio::test]
async fn test_failure_after_partial_output_leaves_stream_open_ended() {
    // 中途失败只记录日志，不补发结束帧和 [DONE]
    let backend = ScriptedBackend::new(vec![
        ScriptStep::Chunk(BackendChunk::content("部分")),
        ScriptStep::Fail("连接中断".to_string()),
    ]);
    let frames = run_sse(backend, ResponseEnvelope::new(None)).await;

    assert_eq!(frames.len(), 1);
    assert_eq!(frame_json(&frames[0])["choices"][0]["delta"]["content"], "部分");
    assert!(frames.iter().all(|f| f != DONE_FRAME));
    assert!(frames.iter().all(|f| !f.contains(ERROR_MARKER)));
}

#[tokio::test]
async fn test_buffered_failure_returns_backend_error() {
    let backend: Arc<dyn AssistantBackend> = Arc::new(ScriptedBackend::new(vec![
        ScriptStep::Chunk(BackendChunk::content("x")),
        ScriptStep::Fail("boom".to_string()),
    ]));
    let envelope = ResponseEnvelope::new(None);
    let err = collect_response(drive_backend(backend, request()), &envelope)
        .await
        .unwrap_err();
    assert_eq!(err.message, "boom");
}

#[tokio::test]
async fn test_hello_scenario_buffered() {
    let backend: Arc<dyn AssistantBackend> = Arc::new(ScriptedBackend::from_texts(["He", "llo"]));
    let envelope = ResponseEnvelope::new(Some(Value::from("m")));
    let response = collect_response(drive_backend(backend, request()), &envelope)
        .await
        .unwrap();

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["object"], "chat.completion");
    assert_eq!(json["model"], "m");
    assert_eq!(json["choices"][0]["message"]["role"], "assistant");
    assert_eq!(json["choices"][0]["message"]["content"], "Hello");
    assert_eq!(json["choices"][0]["finish_reason"], "stop");
    assert!(json["choices"][0]["message"].get("tool_calls").is_none());
}

#[tokio::test]
async fn test_dropping_stream_cancels_backend() {
    let backend = Arc::new(ScriptedBackend::from_texts(["a", "b", "c", "d"]));
    let dyn_backend: Arc<dyn AssistantBackend> = backend.clone();
    let mut events = drive_backend(dyn_backend, request());

    assert!(matches!(events.next().await, Some(BridgeEvent::Chunk(_))));
    drop(events);
    tokio::task::yield_now().await;

    // 后端停在第二个 chunk 的 send 上，随流一起被丢弃，没有运行到返回
    assert_eq!(backend.call_count(), 1);
    assert_eq!(backend.completed_count(), 0);
    assert!(backend.delivered_count() < 4);
}

#[tokio::test]
async fn test_completed_backend_is_counted() {
    let backend = Arc::new(ScriptedBackend::from_texts(["a", "b"]));
    let dyn_backend: Arc<dyn AssistantBackend> = backend.clone();
    let events: Vec<BridgeEvent> = drive_backend(dyn_backend, request()).collect().await;

    assert_eq!(events.len(), 3);
    assert_eq!(backend.completed_count(), 1);
    assert_eq!(backend.delivered_count(), 2);
}
