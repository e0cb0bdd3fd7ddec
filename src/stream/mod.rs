//! 流式桥接层
//!
//! 把回调式后端产出的 chunk 转换为 OpenAI 线上格式，包括：
//! - 事件类型定义 (events)
//! - 响应信封 (envelope)
//! - 上游 SSE 解析 (parsers)
//! - OpenAI SSE 帧生成 (generators)
//! - 非流式累积 (accumulator)
//! - 驱动后端调用并按模式输出 (pipeline)
//!
//! # 架构设计
//!
//! ```text
//! 后端回调 ──> [ChunkSink] ──> BridgeEvent ──┬─> [OpenAiSseGenerator] ──> SSE 帧
//!                                           └─> [Accumulator] ──> JSON 响应
//! ```

pub mod accumulator;
pub mod envelope;
pub mod events;
pub mod generators;
pub mod parsers;
pub mod pipeline;

#[cfg(test)]
mod tests;

// 重新导出核心类型
pub use accumulator::Accumulator;
pub use envelope::ResponseEnvelope;
pub use events::{
    BackendChunk, BridgeEvent, ChunkSink, FinishReason, SinkClosed, CHUNK_CHANNEL_CAPACITY,
};
pub use generators::{OpenAiSseGenerator, DONE_FRAME, ERROR_MARKER};
pub use parsers::{OpenAiSseParser, ParsedData};
pub use pipeline::{collect_response, commit_sse_stream, drive_backend, sse_frames, EventStream};
