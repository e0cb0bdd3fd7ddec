//! 协议转换层
//!
//! 把入站的 OpenAI Chat Completions 请求整理为后端请求：
//!
//! ```text
//! translator/
//! ├── traits.rs    # 转换器 trait 与错误类型
//! └── openai.rs    # OpenAI 请求 → BackendRequest
//! ```

pub mod openai;
pub mod traits;

// 重新导出核心类型
pub use openai::{build_backend_request, OpenAiRequestTranslator, TranslatedRequest};
pub use traits::{RequestTranslator, TranslateError, TranslateErrorKind};
