//! 后端调用层
//!
//! 后端以回调方式产出内容：调用方传入 `ChunkSink`，后端逐块推送
//! `BackendChunk`，调用返回即表示完成或失败。
//!
//! ```text
//! backends/
//! ├── traits.rs          # AssistantBackend trait 与错误类型
//! ├── openai_compat.rs   # OpenAI 兼容上游
//! └── scripted.rs        # 按脚本推送 chunk，用于测试和本地调试
//! ```

pub mod openai_compat;
pub mod scripted;
pub mod traits;

pub use openai_compat::OpenAiCompatBackend;
pub use scripted::{ScriptStep, ScriptedBackend};
pub use traits::{AssistantBackend, BackendError, BackendErrorKind, BackendRequest, BackendResult};
