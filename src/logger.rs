//! 日志模块
//!
//! 初始化 tracing 订阅器，并在输出请求体、上游错误等内容前做脱敏。
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::Level;

/// 脱敏规则（模式, 替换文本）
const SANITIZE_RULES: &[(&str, &str)] = &[
    // Bearer token
    (r"Bearer\s+[A-Za-z0-9._-]+", "Bearer ***"),
    // API key 各种格式
    (
        r#"api[_-]?key["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
        "api_key: ***",
    ),
    (
        r#"access[_-]?token["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
        "access_token: ***",
    ),
    (
        r#"refresh[_-]?token["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
        "refresh_token: ***",
    ),
    // 通用 token，放在 access/refresh 之后
    (r#"\btoken["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#, "token: ***"),
    (
        r#"client[_-]?secret["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
        "client_secret: ***",
    ),
    (r#"password["']?\s*[:=]\s*["']?[^\s"',}]+"#, "password: ***"),
];

static SANITIZE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    SANITIZE_RULES
        .iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|re| (re, *replacement))
        })
        .collect()
});

/// 解析日志级别，无法识别时回退到 info
pub fn parse_level(level: &str) -> Level {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// 初始化全局日志订阅器；重复调用时忽略
pub fn init_logging(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_target(false)
        .try_init();
}

/// 日志脱敏
pub fn sanitize_log_message(message: &str) -> String {
    let mut sanitized = message.to_string();
    for (re, replacement) in SANITIZE_PATTERNS.iter() {
        sanitized = re.replace_all(&sanitized, *replacement).to_string();
    }
    sanitized
}
