//! 后端流事件类型
//!
//! 后端通过 `ChunkSink` 逐块推送 `BackendChunk`，桥接层消费这些 chunk 并生成
//! OpenAI 线上格式。
//!
//! # 设计原则
//!
//! - 后端只产出 `BackendChunk`，不关心前端协议
//! - 通道容量为 1，保证顺序且最多一个未消费的 chunk
//! - 后端调用的结束（成功或失败）以 `BridgeEvent::Finished` 表示，排在所有 chunk 之后

use crate::backends::BackendError;
use crate::models::openai::ToolCallDelta;
use tokio::sync::mpsc;

/// 通道容量
pub const CHUNK_CHANNEL_CAPACITY: usize = 1;

/// 后端推送的单个 chunk
///
/// 每个 chunk 只属于一种类型，文本和工具调用不会出现在同一个 chunk 中。
#[derive(Debug, Clone, PartialEq)]
pub enum BackendChunk {
    /// 文本内容
    Content { text: String },
    /// 工具调用增量序列
    ToolCalls { calls: Vec<ToolCallDelta> },
}

impl BackendChunk {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    pub fn tool_calls(calls: Vec<ToolCallDelta>) -> Self {
        Self::ToolCalls { calls }
    }

    pub fn is_tool_calls(&self) -> bool {
        matches!(self, Self::ToolCalls { .. })
    }
}

/// 桥接层消费的事件
#[derive(Debug)]
pub enum BridgeEvent {
    /// 后端推送的 chunk
    Chunk(BackendChunk),
    /// 后端调用结束
    Finished(Result<(), BackendError>),
}

/// 停止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinishReason {
    /// 正常结束
    #[default]
    Stop,
    /// 出现过工具调用
    ToolCalls,
}

impl FinishReason {
    /// 根据是否出现过工具调用 chunk 决定停止原因
    pub fn from_tool_calls_seen(seen: bool) -> Self {
        if seen {
            Self::ToolCalls
        } else {
            Self::Stop
        }
    }

    /// 转换为 OpenAI 格式的字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::ToolCalls => "tool_calls",
        }
    }
}

/// 后端写入 chunk 的句柄
///
/// 对应回调式接口中的回调函数。接收端被丢弃（客户端断开）时写入会失败，
/// 后端可以据此提前结束。
#[derive(Debug)]
pub struct ChunkSink {
    tx: mpsc::Sender<BackendChunk>,
}

/// 接收端已关闭
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("chunk 接收端已关闭")]
pub struct SinkClosed;

impl ChunkSink {
    /// 创建一对 sink / receiver
    pub fn channel() -> (Self, mpsc::Receiver<BackendChunk>) {
        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        (Self { tx }, rx)
    }

    /// 推送一个 chunk，等待上一个 chunk 被消费
    pub async fn send(&self, chunk: BackendChunk) -> Result<(), SinkClosed> {
        self.tx.send(chunk).await.map_err(|_| SinkClosed)
    }

    /// 推送文本
    pub async fn send_content(&self, text: impl Into<String>) -> Result<(), SinkClosed> {
        self.send(BackendChunk::content(text)).await
    }

    /// 推送工具调用
    pub async fn send_tool_calls(&self, calls: Vec<ToolCallDelta>) -> Result<(), SinkClosed> {
        self.send(BackendChunk::tool_calls(calls)).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
