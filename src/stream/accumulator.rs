//! 非流式模式的响应累积器

use crate::models::openai::{ChatCompletionResponse, Choice, ResponseMessage, ToolCallDelta};
use crate::stream::envelope::ResponseEnvelope;
use crate::stream::events::{BackendChunk, FinishReason};

/// 累积后端 chunk，最终生成一个完整的 JSON 响应
///
/// - 文本 chunk 按到达顺序拼接
/// - 工具调用 chunk 整体替换之前的工具调用
#[derive(Debug, Default)]
pub struct Accumulator {
    content: String,
    tool_calls: Vec<ToolCallDelta>,
    saw_tool_calls: bool,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: BackendChunk) {
        match chunk {
            BackendChunk::Content { text } => self.content.push_str(&text),
            BackendChunk::ToolCalls { calls } => {
                self.saw_tool_calls = true;
                self.tool_calls = calls;
            }
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tool_calls(&self) -> &[ToolCallDelta] {
        &self.tool_calls
    }

    pub fn finish_reason(&self) -> FinishReason {
        FinishReason::from_tool_calls_seen(self.saw_tool_calls)
    }

    /// 生成非流式响应，消耗累积器
    pub fn into_response(self, envelope: &ResponseEnvelope) -> ChatCompletionResponse {
        let finish_reason = self.finish_reason();
        let tool_calls = if self.tool_calls.is_empty() {
            None
        } else {
            Some(self.tool_calls)
        };

        ChatCompletionResponse {
            id: envelope.id.clone(),
            object: "chat.completion".to_string(),
            created: envelope.created,
            model: envelope.model.clone(),
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: "assistant".to_string(),
                    content: self.content,
                    tool_calls,
                },
                finish_reason: finish_reason.as_str().to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::openai::FunctionDelta;

    fn call(id: &str) -> ToolCallDelta {
        ToolCallDelta {
            index: Some(0),
            id: Some(id.to_string()),
            call_type: Some("function".to_string()),
            function: Some(FunctionDelta {
                name: Some("search".to_string()),
                arguments: Some("{}".to_string()),
            }),
        }
    }

    fn envelope() -> ResponseEnvelope {
        ResponseEnvelope {
            id: "chatcmpl-42".to_string(),
            created: 42,
            model: Some(serde_json::Value::from("m")),
        }
    }

    #[test]
    fn test_content_concatenates_in_order() {
        let mut acc = Accumulator::new();
        acc.push(BackendChunk::content("He"));
        acc.push(BackendChunk::content("llo"));

        let resp = acc.into_response(&envelope());
        assert_eq!(resp.object, "chat.completion");
        assert_eq!(resp.id, "chatcmpl-42");
        assert_eq!(resp.choices[0].message.role, "assistant");
        assert_eq!(resp.choices[0].message.content, "Hello");
        assert_eq!(resp.choices[0].finish_reason, "stop");
        assert!(resp.choices[0].message.tool_calls.is_none());
    }

    #[test]
    fn test_tool_calls_replace_previous() {
        let mut acc = Accumulator::new();
        acc.push(BackendChunk::tool_calls(vec![call("a")]));
        acc.push(BackendChunk::content("text"));
        acc.push(BackendChunk::tool_calls(vec![call("b"), call("c")]));

        assert_eq!(acc.tool_calls().len(), 2);
        let resp = acc.into_response(&envelope());
        let calls = resp.choices[0].message.tool_calls.clone().unwrap();
        assert_eq!(calls[0].id.as_deref(), Some("b"));
        assert_eq!(calls[1].id.as_deref(), Some("c"));
        assert_eq!(resp.choices[0].message.content, "text");
        assert_eq!(resp.choices[0].finish_reason, "tool_calls");
    }

    #[test]
    fn test_empty_tool_calls_chunk_still_marks_tool_calls() {
        let mut acc = Accumulator::new();
        acc.push(BackendChunk::tool_calls(vec![]));
        assert_eq!(acc.finish_reason(), FinishReason::ToolCalls);

        let value = serde_json::to_value(acc.into_response(&envelope())).unwrap();
        assert!(value["choices"][0]["message"].get("tool_calls").is_none());
        assert_eq!(value["choices"][0]["finish_reason"], "tool_calls");
    }
}
