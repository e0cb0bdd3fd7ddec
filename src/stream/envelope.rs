//! 响应信封
//!
//! 一次请求输出的所有单元（SSE 帧或最终 JSON）共享同一组 `id` / `created` / `model`。

use chrono::{DateTime, Utc};
use serde_json::Value;

/// 单次补全的身份字段，提交时计算一次，之后不再变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    /// `chatcmpl-<提交时间毫秒>`
    pub id: String,
    /// 提交时间（秒）
    pub created: i64,
    /// 请求中的模型标识，原样回显
    pub model: Option<Value>,
}

impl ResponseEnvelope {
    /// 以当前时间创建信封
    pub fn new(model: Option<Value>) -> Self {
        Self::at(Utc::now(), model)
    }

    /// 以指定提交时间创建信封
    pub fn at(submitted: DateTime<Utc>, model: Option<Value>) -> Self {
        Self {
            id: format!("chatcmpl-{}", submitted.timestamp_millis()),
            created: submitted.timestamp(),
            model,
        }
    }
}
