//! OpenAI Chat Completions 协议数据结构
//!
//! 入站请求、流式 chunk、非流式响应以及模型列表的线上格式。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Chat Completions 请求
///
/// 只解构网关关心的字段，其余字段原样保留在 `params` 中透传给后端。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletionRequest {
    /// 消息列表（只校验存在性，不校验内容）
    #[serde(default)]
    pub messages: Option<Value>,
    /// 模型标识，不校验类型，原样回显
    #[serde(default, deserialize_with = "present")]
    pub model: Option<Value>,
    /// 流式标志，不校验类型；缺省时为 true，`null` 视为 false
    #[serde(default, deserialize_with = "present")]
    pub stream: Option<Value>,
    /// 工具定义
    #[serde(default)]
    pub tools: Option<Value>,
    /// 其余后端参数
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ChatCompletionRequest {
    /// 实际生效的流式标志
    pub fn is_stream(&self) -> bool {
        self.stream.as_ref().map_or(true, is_truthy)
    }
}

/// 字段出现即为 `Some`，显式的 `null` 保留为 `Some(Value::Null)`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// JSON 值的真假：`null`、`false`、`0`、`""` 为假，其余为真
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// 工具调用增量
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionDelta>,
}

/// 函数调用增量
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

// ============================================================================
// 流式响应
// ============================================================================

/// 流式 chunk（`object: "chat.completion.chunk"`）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Value>,
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    pub index: u32,
    pub delta: StreamDelta,
    /// 未结束时序列化为 `null`
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

// ============================================================================
// 非流式响应
// ============================================================================

/// 非流式响应（`object: "chat.completion"`）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Value>,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: String,
}

/// 助手消息；没有工具调用时不输出 `tool_calls`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

// ============================================================================
// 模型列表
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default = "default_model_object")]
    pub object: String,
    #[serde(default)]
    pub owned_by: String,
}

fn default_model_object() -> String {
    "model".to_string()
}

impl ModelInfo {
    pub fn new(id: impl Into<String>, owned_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: default_model_object(),
            owned_by: owned_by.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

impl ModelList {
    pub fn new(data: Vec<ModelInfo>) -> Self {
        Self {
            object: "list".to_string(),
            data,
        }
    }
}
