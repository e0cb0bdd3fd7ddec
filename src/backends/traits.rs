//! 后端调用层 Trait 定义
//!
//! 后端以回调方式逐块产出响应：实现者把每个 chunk 推入 `ChunkSink`，
//! 调用返回即表示响应结束。后端层不包含任何前端协议转换逻辑。

use crate::models::openai::ModelInfo;
use crate::stream::events::ChunkSink;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// 后端调用结果
pub type BackendResult<T> = Result<T, BackendError>;

/// 后端错误类型
#[derive(Debug, Clone)]
pub struct BackendError {
    /// 错误类型
    pub kind: BackendErrorKind,
    /// 错误消息
    pub message: String,
    /// HTTP 状态码（如果有）
    pub status_code: Option<u16>,
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(code) = self.status_code {
            write!(f, "{} ({}): {}", self.kind, code, self.message)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for BackendError {}

/// 后端错误类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// 认证错误
    AuthenticationError,
    /// 网络错误
    NetworkError,
    /// 服务端错误
    ServerError,
    /// 请求格式错误
    BadRequest,
    /// 速率限制
    RateLimited,
    /// 响应格式无法解析
    InvalidResponse,
    /// 其他错误
    Other,
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationError => write!(f, "AuthenticationError"),
            Self::NetworkError => write!(f, "NetworkError"),
            Self::ServerError => write!(f, "ServerError"),
            Self::BadRequest => write!(f, "BadRequest"),
            Self::RateLimited => write!(f, "RateLimited"),
            Self::InvalidResponse => write!(f, "InvalidResponse"),
            Self::Other => write!(f, "Other"),
        }
    }
}

impl BackendError {
    /// 创建新的后端错误
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
        }
    }

    /// 带 HTTP 状态码创建错误
    pub fn with_status(kind: BackendErrorKind, message: impl Into<String>, status: u16) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: Some(status),
        }
    }

    /// 从 HTTP 状态码推断错误类型
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => BackendErrorKind::AuthenticationError,
            400 => BackendErrorKind::BadRequest,
            429 => BackendErrorKind::RateLimited,
            500..=599 => BackendErrorKind::ServerError,
            _ => BackendErrorKind::Other,
        };
        Self::with_status(kind, message, status)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::from_status(status.as_u16(), err.to_string()),
            None if err.is_decode() => {
                Self::new(BackendErrorKind::InvalidResponse, err.to_string())
            }
            None => Self::new(BackendErrorKind::NetworkError, err.to_string()),
        }
    }
}

/// 发给后端的请求
///
/// `{model?, messages, tools?, ...params}`，未知参数原样透传。
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    body: Map<String, Value>,
}

impl BackendRequest {
    pub fn from_map(body: Map<String, Value>) -> Self {
        Self { body }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn model(&self) -> Option<&str> {
        self.body.get("model").and_then(|v| v.as_str())
    }

    pub fn messages(&self) -> Option<&Value> {
        self.body.get("messages")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }
}

/// 助手后端 Trait
///
/// 对应回调式的后端客户端：模型枚举 + 响应生成。
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// 列出可用模型
    async fn list_models(&self) -> BackendResult<Vec<ModelInfo>>;

    /// 生成响应
    ///
    /// 按顺序把每个 chunk 推入 `sink`；返回 `Ok(())` 表示响应正常结束。
    /// 实现者不得在返回后继续持有 `sink`。
    async fn generate(&self, request: BackendRequest, sink: ChunkSink) -> BackendResult<()>;

    /// 获取后端名称
    fn name(&self) -> &str;
}
