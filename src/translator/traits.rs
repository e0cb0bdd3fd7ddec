//! 协议转换器 Trait 定义
//!
//! 将前端协议请求转换为后端请求。转换只做结构整理和存在性校验，
//! 不做任何网络调用。

/// 请求转换器 Trait
///
/// # 类型参数
///
/// - `Input`: 前端请求类型（如原始请求体）
/// - `Output`: 转换结果
/// - `Error`: 转换错误类型
pub trait RequestTranslator {
    /// 前端请求类型
    type Input;
    /// 转换结果类型
    type Output;
    /// 转换错误类型
    type Error: std::error::Error;

    /// 转换请求
    fn translate_request(&self, request: Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 转换错误
#[derive(Debug, Clone)]
pub struct TranslateError {
    /// 错误类型
    pub kind: TranslateErrorKind,
    /// 返回给客户端的错误消息
    pub message: String,
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TranslateError {}

/// 转换错误类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateErrorKind {
    /// 请求体不是合法的 JSON，或字段类型不符
    InvalidJson,
    /// 缺少 `messages`
    MissingMessages,
}

impl std::fmt::Display for TranslateErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "InvalidJson"),
            Self::MissingMessages => write!(f, "MissingMessages"),
        }
    }
}

impl TranslateError {
    pub fn new(kind: TranslateErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 请求体解析失败
    pub fn invalid_json(detail: impl std::fmt::Display) -> Self {
        Self::new(
            TranslateErrorKind::InvalidJson,
            format!("请求体不是合法的 JSON: {}", detail),
        )
    }

    /// 缺少 `messages`
    pub fn missing_messages() -> Self {
        Self::new(TranslateErrorKind::MissingMessages, "messages is required")
    }
}
