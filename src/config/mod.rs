//! 配置模块
//!
//! YAML 配置文件 + 环境变量覆盖，进程启动时加载一次。

mod loader;
mod types;

pub use loader::{
    apply_env_overrides, expand_tilde, load_config, load_from_file, parse_size,
    resolve_config_path,
};
pub use types::{Config, UpstreamConfig};

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件格式错误: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("无效的大小配置: {0}")]
    InvalidSize(String),

    #[error("无效的端口: {0}")]
    InvalidPort(String),

    #[error("无效的监听地址: {0}")]
    InvalidAddress(String),
}
