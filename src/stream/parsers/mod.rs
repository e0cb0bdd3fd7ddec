//! 流式数据解析器
//!
//! 解析上游后端的流式响应格式，输出 `BackendChunk`。

pub mod openai_sse;

pub use openai_sse::{OpenAiSseParser, ParsedData};
