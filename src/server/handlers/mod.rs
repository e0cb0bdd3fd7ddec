//! HTTP 处理器

mod chat;
mod health;
mod models;
mod upload;

pub use chat::{build_sse_response, chat_completions};
pub use health::health;
pub use models::models;
pub use upload::upload_token;
