//! SSE 流生成器
//!
//! 将 `BackendChunk` 转换为前端协议的 SSE 格式。

pub mod openai_sse;

pub use openai_sse::{OpenAiSseGenerator, DONE_FRAME, ERROR_MARKER};
