//! OpenAI 兼容上游后端
//!
//! 把后端请求以 `stream: true` 发送到上游 `/chat/completions`，
//! 解析上游 SSE，并将每个增量作为 `BackendChunk` 推入 sink。

use super::traits::{
    AssistantBackend, BackendError, BackendErrorKind, BackendRequest, BackendResult,
};
use crate::config::UpstreamConfig;
use crate::credential::CredentialStore;
use crate::logger::sanitize_log_message;
use crate::models::openai::{ModelInfo, ModelList};
use crate::stream::events::ChunkSink;
use crate::stream::parsers::OpenAiSseParser;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

/// OpenAI 兼容上游后端
pub struct OpenAiCompatBackend {
    client: Client,
    config: UpstreamConfig,
    credentials: Arc<CredentialStore>,
}

impl OpenAiCompatBackend {
    pub fn new(config: UpstreamConfig, credentials: Arc<CredentialStore>) -> Self {
        Self {
            client: Client::new(),
            config,
            credentials,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 配置的 API Key 优先，否则使用上传的凭证
    async fn bearer_token(&self) -> BackendResult<Option<String>> {
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            return Ok(Some(key.to_string()));
        }
        self.credentials.access_token().await.map_err(|e| {
            BackendError::new(BackendErrorKind::AuthenticationError, e.to_string())
        })
    }

    fn authorize(
        &self,
        builder: reqwest::RequestBuilder,
        token: Option<String>,
    ) -> reqwest::RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// 非 2xx 响应转换为后端错误
    async fn check_status(response: reqwest::Response) -> BackendResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message").or(Some(e)))
                    .map(|m| m.as_str().map(|s| s.to_string()).unwrap_or_else(|| m.to_string()))
            })
            .unwrap_or(body);
        error!(
            "[UPSTREAM] 上游返回错误状态 {}: {}",
            status,
            sanitize_log_message(&message)
        );
        Err(BackendError::from_status(status.as_u16(), message))
    }
}

#[async_trait]
impl AssistantBackend for OpenAiCompatBackend {
    async fn list_models(&self) -> BackendResult<Vec<ModelInfo>> {
        if !self.config.models.is_empty() {
            return Ok(self.config.models.clone());
        }

        let token = self.bearer_token().await?;
        let response = self
            .authorize(self.client.get(self.endpoint("models")), token)
            .send()
            .await?;
        let list: ModelList = Self::check_status(response).await?.json().await?;
        Ok(list.data)
    }

    async fn generate(&self, request: BackendRequest, sink: ChunkSink) -> BackendResult<()> {
        let mut body = request.into_value();
        body["stream"] = Value::Bool(true);

        let token = self.bearer_token().await?;
        info!(
            "[UPSTREAM] 请求上游: url={}, model={:?}",
            self.endpoint("chat/completions"),
            body.get("model")
        );

        let response = self
            .authorize(self.client.post(self.endpoint("chat/completions")), token)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let mut stream = response.bytes_stream();
        let mut parser = OpenAiSseParser::new();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| {
                error!("[UPSTREAM] 流读取错误: {}", e);
                BackendError::new(BackendErrorKind::NetworkError, format!("流读取错误: {}", e))
            })?;

            for data in parser.feed(&bytes) {
                debug!("[UPSTREAM] SSE data: {}", data);
                if deliver(&data, &sink).await? {
                    return Ok(());
                }
            }
        }

        // 流正常结束但没有收到 [DONE]
        for data in parser.finish() {
            if deliver(&data, &sink).await? {
                break;
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "openai-compat"
    }
}

/// 推送一个负载中的所有 chunk；返回 `true` 表示应停止读取
async fn deliver(data: &str, sink: &ChunkSink) -> BackendResult<bool> {
    let parsed = OpenAiSseParser::parse_data(data);
    if let Some(message) = parsed.error {
        return Err(BackendError::new(BackendErrorKind::ServerError, message));
    }
    for chunk in parsed.chunks {
        if sink.send(chunk).await.is_err() {
            debug!("[UPSTREAM] 客户端已断开，停止读取上游");
            return Ok(true);
        }
    }
    Ok(parsed.done)
}
