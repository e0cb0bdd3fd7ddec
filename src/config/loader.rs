//! 配置加载
//!
//! 查找顺序：命令行第一个参数 → `CHATBRIDGE_CONFIG` → `~/.chatbridge/config.yaml`
//! → 内置默认值。加载后再应用环境变量覆盖。

use std::path::{Path, PathBuf};

use super::types::Config;
use super::ConfigError;

/// 配置文件路径环境变量
pub const CONFIG_ENV: &str = "CHATBRIDGE_CONFIG";
/// 监听地址覆盖
pub const HOST_ENV: &str = "CHATBRIDGE_HOST";
/// 端口覆盖
pub const PORT_ENV: &str = "CHATBRIDGE_PORT";
/// API Key 覆盖
pub const API_KEY_ENV: &str = "CHATBRIDGE_API_KEY";

/// 展开路径开头的 `~`
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

/// 解析人类可读的大小，如 `50mb`、`512kb`、`1gb`、`2048`
pub fn parse_size(input: &str) -> Result<usize, ConfigError> {
    let s = input.trim().to_ascii_lowercase();
    let invalid = || ConfigError::InvalidSize(input.to_string());

    let split = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let number: f64 = number.parse().map_err(|_| invalid())?;

    let multiplier: f64 = match unit.trim() {
        "" | "b" => 1.0,
        "kb" | "k" => 1024.0,
        "mb" | "m" => 1024.0 * 1024.0,
        "gb" | "g" => 1024.0 * 1024.0 * 1024.0,
        _ => return Err(invalid()),
    };

    Ok((number * multiplier) as usize)
}

/// 确定配置文件路径
pub fn resolve_config_path(cli_arg: Option<&str>) -> Option<PathBuf> {
    if let Some(arg) = cli_arg.filter(|s| !s.is_empty()) {
        return Some(expand_tilde(arg));
    }
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.is_empty() {
            return Some(expand_tilde(&env_path));
        }
    }
    let default_path = expand_tilde("~/.chatbridge/config.yaml");
    default_path.exists().then_some(default_path)
}

/// 从 YAML 文件加载配置
pub fn load_from_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_yaml::from_str(&content)?)
}

/// 应用环境变量覆盖
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(HOST_ENV) {
        config.host = host;
    }
    if let Some(port) = lookup(PORT_ENV) {
        config.port = port
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
    }
    if let Some(key) = lookup(API_KEY_ENV) {
        config.api_key = key;
    }
    Ok(())
}

/// 加载完整配置
pub fn load_config(cli_arg: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match resolve_config_path(cli_arg) {
        Some(path) => {
            tracing::info!("[CONFIG] 加载配置文件: {}", path.display());
            load_from_file(&path)?
        }
        None => Config::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}
