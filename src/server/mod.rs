//! HTTP 服务
//!
//! ```text
//! GET  /health               健康检查
//! GET  /v1/models            模型列表
//! POST /v1/chat/completions  Chat Completions（SSE 或 JSON）
//! POST /api/upload-token     上传凭证
//! *                          静态文件（配置了 static_dir 时）
//! ```

mod error;
pub mod handlers;

pub use error::ApiError;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::backends::AssistantBackend;
use crate::config::{Config, ConfigError};
use crate::credential::CredentialStore;
use crate::middleware::{limit_body, require_api_key};

/// 请求间共享的只读状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: Arc<dyn AssistantBackend>,
    pub credentials: Arc<CredentialStore>,
    /// 解析后的请求体上限（字节）
    pub body_limit: usize,
}

impl AppState {
    pub fn new(
        config: Config,
        backend: Arc<dyn AssistantBackend>,
        credentials: Arc<CredentialStore>,
    ) -> Result<Self, ConfigError> {
        let body_limit = config.body_limit_bytes()?;
        Ok(Self {
            config: Arc::new(config),
            backend,
            credentials,
            body_limit,
        })
    }
}

/// 服务错误
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("端口 {addr} 已被占用")]
    AddrInUse { addr: String },

    #[error("没有权限监听 {addr}")]
    PermissionDenied { addr: String },

    #[error("监听 {addr} 失败: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("服务运行错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 构建路由
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/models", get(handlers::models))
        .route("/v1/chat/completions", post(handlers::chat_completions))
        .route("/api/upload-token", post(handlers::upload_token));

    if let Some(dir) = state.config.static_dir_path() {
        tracing::info!("[SERVER] 静态文件目录: {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir));
    }

    // 后添加的 layer 先执行：大小限制 → 认证 → 处理器
    router
        .layer(DefaultBodyLimit::max(state.body_limit))
        .layer(from_fn_with_state(state.clone(), require_api_key))
        .layer(from_fn_with_state(state.clone(), limit_body))
        .with_state(state)
}

/// 绑定监听地址
pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr).await.map_err(|source| {
        let addr = addr.to_string();
        match source.kind() {
            std::io::ErrorKind::AddrInUse => {
                tracing::error!("[SERVER] 端口已被占用: {}", addr);
                ServerError::AddrInUse { addr }
            }
            std::io::ErrorKind::PermissionDenied => {
                tracing::error!("[SERVER] 没有权限监听: {}", addr);
                ServerError::PermissionDenied { addr }
            }
            _ => {
                tracing::error!("[SERVER] 监听失败 {}: {}", addr, source);
                ServerError::Bind { addr, source }
            }
        }
    })
}

/// 启动服务，直到收到 Ctrl+C
pub async fn run_server(state: AppState) -> Result<(), ServerError> {
    let addr = state.config.listen_addr();
    let listener = bind(&addr).await?;

    tracing::info!("[SERVER] 服务已启动: http://{}", addr);
    if state.config.api_key().is_none() {
        tracing::warn!("[SERVER] 未配置 API Key，/v1/ 接口不做认证");
    }

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("[SERVER] 服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[SERVER] 监听退出信号失败: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::ScriptedBackend;

    #[tokio::test]
    async fn test_bind_addr_in_use() {
        let first = bind("127.0.0.1:0").await.unwrap();
        let addr = first.local_addr().unwrap().to_string();

        let err = bind(&addr).await.unwrap_err();
        assert!(matches!(err, ServerError::AddrInUse { .. }));
    }

    #[test]
    fn test_app_state_rejects_bad_limit() {
        let config = Config {
            body_limit: "huge".to_string(),
            ..Default::default()
        };
        let result = AppState::new(
            config,
            Arc::new(ScriptedBackend::default()),
            Arc::new(CredentialStore::new("/tmp/unused.json")),
        );
        assert!(result.is_err());
    }
}
