//! 凭证模块
//!
//! 负责上传凭证的持久化与读取。

pub mod store;

pub use store::{CredentialError, CredentialStore};
