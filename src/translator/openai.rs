//! OpenAI 请求转换为后端请求
//!
//! 只校验 `messages` 是否存在；`model`、`stream`、`tools` 单独解构但不校验类型，
//! 其余字段作为后端参数原样透传。

use crate::backends::BackendRequest;
use crate::models::openai::ChatCompletionRequest;
use crate::translator::traits::{RequestTranslator, TranslateError};
use bytes::Bytes;
use serde_json::{Map, Value};

/// 转换结果
#[derive(Debug, Clone)]
pub struct TranslatedRequest {
    /// 交给后端的请求
    pub backend_request: BackendRequest,
    /// 实际生效的流式标志
    pub stream: bool,
    /// 回显用的模型标识
    pub model: Option<Value>,
}

/// OpenAI 请求转换器
#[derive(Debug, Clone, Default)]
pub struct OpenAiRequestTranslator;

impl OpenAiRequestTranslator {
    pub fn new() -> Self {
        Self
    }

    /// 解析请求体；空请求体按 `{}` 处理
    pub fn parse(&self, body: &[u8]) -> Result<ChatCompletionRequest, TranslateError> {
        let body = if body.iter().all(u8::is_ascii_whitespace) {
            b"{}".as_slice()
        } else {
            body
        };
        serde_json::from_slice(body).map_err(TranslateError::invalid_json)
    }
}

impl RequestTranslator for OpenAiRequestTranslator {
    type Input = Bytes;
    type Output = TranslatedRequest;
    type Error = TranslateError;

    fn translate_request(&self, request: Self::Input) -> Result<Self::Output, Self::Error> {
        let request = self.parse(&request)?;
        let stream = request.is_stream();
        let ChatCompletionRequest {
            messages,
            model,
            tools,
            params,
            ..
        } = request;

        let messages = messages.ok_or_else(TranslateError::missing_messages)?;
        let backend_request = build_backend_request(messages, model.clone(), tools, params);

        Ok(TranslatedRequest {
            backend_request,
            stream,
            model,
        })
    }
}

/// 组装后端请求
///
/// `model`、`messages`、`tools` 覆盖同名的透传参数；流式标志不下发。
pub fn build_backend_request(
    messages: Value,
    model: Option<Value>,
    tools: Option<Value>,
    params: Map<String, Value>,
) -> BackendRequest {
    let mut body = params;
    body.remove("stream");
    if let Some(model) = model {
        body.insert("model".to_string(), model);
    }
    body.insert("messages".to_string(), messages);
    if let Some(tools) = tools {
        body.insert("tools".to_string(), tools);
    }
    BackendRequest::from_map(body)
}
