//! 凭证文件存储
//!
//! 上传接口把客户端提交的 JSON 原样写入本地凭证文件，
//! 上游后端在每次调用时从中读取 access token。

use serde_json::Value;
use std::path::{Path, PathBuf};

/// 凭证存储错误
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("凭证文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("凭证文件格式错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// 依次查找的 token 字段
const TOKEN_FIELDS: &[&str] = &["access_token", "token", "api_key"];

/// 凭证文件存储
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存上传的凭证，自动创建父目录
    pub async fn save(&self, credential: &Value) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(credential)?;
        tokio::fs::write(&self.path, content).await?;
        tracing::info!("[CREDENTIAL] 凭证已保存到 {}", self.path.display());
        Ok(())
    }

    /// 读取凭证文件；文件不存在时返回 `None`
    pub async fn load(&self) -> Result<Option<Value>, CredentialError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 从凭证文件中取出 access token
    pub async fn access_token(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.load().await?.as_ref().and_then(extract_token))
    }
}

fn extract_token(credential: &Value) -> Option<String> {
    TOKEN_FIELDS.iter().find_map(|field| {
        credential
            .get(*field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    })
}
