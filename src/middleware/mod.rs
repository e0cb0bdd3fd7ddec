//! Middleware 模块
//!
//! 提供 HTTP 请求处理的中间件组件

pub mod auth;
pub mod body_limit;

pub use auth::{extract_api_key, require_api_key, verify_api_key};
pub use body_limit::limit_body;
