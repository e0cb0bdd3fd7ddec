//! chatbridge
//!
//! OpenAI 兼容的 Chat Completions 网关：把入站请求转换为后端请求，
//! 再把回调式后端逐块产出的内容桥接为 SSE 帧或单个 JSON 响应。

pub mod backends;
pub mod config;
pub mod credential;
pub mod logger;
pub mod middleware;
pub mod models;
pub mod server;
pub mod stream;
pub mod translator;

pub use config::Config;
pub use server::{create_router, run_server, AppState};
