//! 配置数据结构

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::loader::{expand_tilde, parse_size};
use super::ConfigError;
use crate::models::openai::ModelInfo;

/// 默认监听地址
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// 默认端口
pub const DEFAULT_PORT: u16 = 8999;
/// 默认请求体上限
pub const DEFAULT_BODY_LIMIT: &str = "50mb";
/// 默认上游地址
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.openai.com/v1";

/// 进程级配置，启动时加载一次，之后只读
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// `/v1/` 路径的 API Key，为空时不校验
    pub api_key: String,
    /// 请求体大小上限，如 `50mb`、`512kb`、`1048576`
    pub body_limit: String,
    /// 日志级别
    pub log_level: String,
    /// 凭证文件路径
    pub token_file: String,
    /// 静态文件目录
    pub static_dir: Option<String>,
    /// 上游后端配置
    pub upstream: UpstreamConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: String::new(),
            body_limit: DEFAULT_BODY_LIMIT.to_string(),
            log_level: "info".to_string(),
            token_file: "~/.chatbridge/token.json".to_string(),
            static_dir: None,
            upstream: UpstreamConfig::default(),
        }
    }
}

impl Config {
    /// 监听地址（`host:port`，host 可以是域名）
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 请求体上限（字节）
    pub fn body_limit_bytes(&self) -> Result<usize, ConfigError> {
        parse_size(&self.body_limit)
    }

    /// 已配置的 API Key
    pub fn api_key(&self) -> Option<&str> {
        Some(self.api_key.as_str()).filter(|k| !k.is_empty())
    }

    /// 展开 `~` 后的凭证文件路径
    pub fn token_file_path(&self) -> PathBuf {
        expand_tilde(&self.token_file)
    }

    /// 展开 `~` 后的静态文件目录
    pub fn static_dir_path(&self) -> Option<PathBuf> {
        self.static_dir
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(expand_tilde)
    }

    /// 校验启动前必须合法的字段
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidAddress(self.listen_addr()));
        }
        self.body_limit_bytes()?;
        Ok(())
    }
}

/// 上游 OpenAI 兼容后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// 上游 API 根地址（不含 `/chat/completions`）
    pub base_url: String,
    /// 上游 API Key；为空时使用上传的凭证
    pub api_key: Option<String>,
    /// 静态模型列表；为空时向上游查询
    pub models: Vec<ModelInfo>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            api_key: None,
            models: Vec::new(),
        }
    }
}
