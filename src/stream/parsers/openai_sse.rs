//! 上游 OpenAI 兼容 SSE 流解析器
//!
//! 把上游字节流切分为 SSE 事件，并把每个 `data:` 负载转换为 `BackendChunk`。

use crate::models::openai::ToolCallDelta;
use crate::stream::events::BackendChunk;
use serde_json::Value;
use tracing::warn;

/// 单个 `data:` 负载的解析结果
#[derive(Debug, Default, PartialEq)]
pub struct ParsedData {
    /// 按顺序产出的 chunk
    pub chunks: Vec<BackendChunk>,
    /// 收到 `[DONE]`
    pub done: bool,
    /// 上游在流中返回的错误
    pub error: Option<String>,
}

/// 上游 SSE 流解析器
///
/// 以字节缓冲，避免多字节字符被网络分包截断。
#[derive(Debug, Default)]
pub struct OpenAiSseParser {
    buffer: Vec<u8>,
}

impl OpenAiSseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加字节，返回已完整到达的事件中的 `data:` 负载
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(pos) = find_event_end(&self.buffer) {
            let event: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            payloads.extend(extract_data_lines(&event[..pos]));
        }
        payloads
    }

    /// 流结束时处理缓冲区中剩余的不完整事件
    pub fn finish(&mut self) -> Vec<String> {
        let rest = std::mem::take(&mut self.buffer);
        extract_data_lines(&rest)
    }

    /// 解析一个 `data:` 负载
    pub fn parse_data(data: &str) -> ParsedData {
        let data = data.trim();
        if data == "[DONE]" {
            return ParsedData {
                done: true,
                ..Default::default()
            };
        }

        let json: Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                warn!("[UPSTREAM] 解析 JSON 失败: {} - data: {}", e, data);
                return ParsedData::default();
            }
        };

        if let Some(err) = json.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| err.to_string());
            return ParsedData {
                error: Some(message),
                ..Default::default()
            };
        }

        let mut parsed = ParsedData::default();
        let Some(delta) = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("delta"))
        else {
            return parsed;
        };

        if let Some(text) = delta
            .get("content")
            .and_then(|c| c.as_str())
            .filter(|s| !s.is_empty())
        {
            parsed.chunks.push(BackendChunk::content(text));
        }

        if let Some(calls) = delta.get("tool_calls").filter(|tc| tc.is_array()) {
            match serde_json::from_value::<Vec<ToolCallDelta>>(calls.clone()) {
                Ok(calls) if !calls.is_empty() => {
                    parsed.chunks.push(BackendChunk::tool_calls(calls));
                }
                Ok(_) => {}
                Err(e) => warn!("[UPSTREAM] 工具调用增量格式错误: {}", e),
            }
        }

        parsed
    }
}

fn find_event_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn extract_data_lines(event: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(event)
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.trim_start().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_delta() {
        let parsed =
            OpenAiSseParser::parse_data(r#"{"choices":[{"delta":{"content":"Hello"}}]}"#);
        assert_eq!(parsed.chunks, vec![BackendChunk::content("Hello")]);
        assert!(!parsed.done);
    }

    #[test]
    fn test_empty_content_is_skipped() {
        let parsed = OpenAiSseParser::parse_data(
            r#"{"choices":[{"delta":{"role":"assistant","content":""}}]}"#,
        );
        assert!(parsed.chunks.is_empty());
    }

    #[test]
    fn test_tool_call_delta() {
        let parsed = OpenAiSseParser::parse_data(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"read_file","arguments":""}}]}}]}"#,
        );
        assert_eq!(parsed.chunks.len(), 1);
        match &parsed.chunks[0] {
            BackendChunk::ToolCalls { calls } => {
                assert_eq!(calls[0].id.as_deref(), Some("call_1"));
                assert_eq!(
                    calls[0].function.as_ref().unwrap().name.as_deref(),
                    Some("read_file")
                );
            }
            other => panic!("unexpected chunk: {:?}", other),
        }
    }

    #[test]
    fn test_content_and_tool_calls_split_into_two_chunks() {
        let parsed = OpenAiSseParser::parse_data(
            r#"{"choices":[{"delta":{"content":"a","tool_calls":[{"index":0}]}}]}"#,
        );
        assert_eq!(parsed.chunks.len(), 2);
        assert_eq!(parsed.chunks[0], BackendChunk::content("a"));
        assert!(parsed.chunks[1].is_tool_calls());
    }

    #[test]
    fn test_done_and_error() {
        assert!(OpenAiSseParser::parse_data("[DONE]").done);
        let parsed = OpenAiSseParser::parse_data(r#"{"error":{"message":"quota exceeded"}}"#);
        assert_eq!(parsed.error.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn test_invalid_json_is_ignored() {
        assert_eq!(OpenAiSseParser::parse_data("{oops"), ParsedData::default());
    }

    #[test]
    fn test_feed_splits_events_across_packets() {
        let mut parser = OpenAiSseParser::new();
        assert!(parser.feed(b"data: {\"a\":").is_empty());
        let payloads = parser.feed(b"1}\n\ndata: [DONE]\n\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "[DONE]".to_string()]);
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn test_feed_keeps_multibyte_chars_intact() {
        let mut parser = OpenAiSseParser::new();
        let frame = "data: 你好\n\n".as_bytes();
        let (head, tail) = frame.split_at(8);
        assert!(parser.feed(head).is_empty());
        assert_eq!(parser.feed(tail), vec!["你好".to_string()]);
    }

    #[test]
    fn test_finish_flushes_partial_event() {
        let mut parser = OpenAiSseParser::new();
        assert!(parser.feed(b": comment\ndata: tail").is_empty());
        assert_eq!(parser.finish(), vec!["tail".to_string()]);
    }
}
