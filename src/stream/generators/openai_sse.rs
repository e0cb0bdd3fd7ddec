//! OpenAI SSE 生成器
//!
//! 将 `BackendChunk` 转换为 OpenAI Chat Completions SSE 格式。
//!
//! # 格式说明
//!
//! ```text
//! data: {"id":"chatcmpl-xxx","object":"chat.completion.chunk","created":1234567890,"model":"gpt-4","choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}
//!
//! data: {"id":"chatcmpl-xxx","object":"chat.completion.chunk","created":1234567890,"model":"gpt-4","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}
//!
//! data: [DONE]
//! ```

use crate::models::openai::{ChatCompletionChunk, StreamChoice, StreamDelta};
use crate::stream::envelope::ResponseEnvelope;
use crate::stream::events::{BackendChunk, FinishReason};
use serde::Serialize;

/// 结束标记帧，原样输出，不做 JSON 编码
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// 错误文本前缀
pub const ERROR_MARKER: &str = "[错误]";

/// OpenAI SSE 生成器
///
/// 每个 chunk 生成恰好一帧；记录是否出现过工具调用以决定结束原因。
#[derive(Debug)]
pub struct OpenAiSseGenerator {
    envelope: ResponseEnvelope,
    saw_tool_calls: bool,
}

impl OpenAiSseGenerator {
    pub fn new(envelope: ResponseEnvelope) -> Self {
        Self {
            envelope,
            saw_tool_calls: false,
        }
    }

    /// 将一个后端 chunk 转换为一帧 SSE
    pub fn generate(&mut self, chunk: &BackendChunk) -> String {
        let delta = match chunk {
            BackendChunk::Content { text } => StreamDelta {
                content: Some(text.clone()),
                tool_calls: None,
            },
            BackendChunk::ToolCalls { calls } => {
                self.saw_tool_calls = true;
                StreamDelta {
                    content: None,
                    tool_calls: Some(calls.clone()),
                }
            }
        };
        self.frame(delta, None)
    }

    /// 生成结束帧（空 delta + finish_reason）
    pub fn generate_finish(&self) -> String {
        self.frame(StreamDelta::default(), Some(self.finish_reason()))
    }

    /// 生成 [DONE] 帧
    pub fn generate_done(&self) -> String {
        DONE_FRAME.to_string()
    }

    /// 后端在输出任何内容前失败时，以文本帧形式告知客户端
    pub fn generate_error(&self, message: &str) -> String {
        self.frame(
            StreamDelta {
                content: Some(format!("{} {}", ERROR_MARKER, message)),
                tool_calls: None,
            },
            None,
        )
    }

    /// 当前的结束原因
    pub fn finish_reason(&self) -> FinishReason {
        FinishReason::from_tool_calls_seen(self.saw_tool_calls)
    }

    pub fn saw_tool_calls(&self) -> bool {
        self.saw_tool_calls
    }

    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    fn frame(&self, delta: StreamDelta, finish_reason: Option<FinishReason>) -> String {
        let chunk = ChatCompletionChunk {
            id: self.envelope.id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: self.envelope.created,
            model: self.envelope.model.clone(),
            choices: vec![StreamChoice {
                index: 0,
                delta,
                finish_reason: finish_reason.map(|r| r.as_str().to_string()),
            }],
        };
        sse_data(&chunk)
    }
}

/// 序列化为 `data: <json>\n\n`
pub fn sse_data<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => format!("data: {}\n\n", json),
        Err(e) => {
            tracing::error!("[BRIDGE] 序列化 SSE 帧失败: {}", e);
            String::new()
        }
    }
}
