//! 脚本化后端
//!
//! 按预设脚本推送 chunk 或返回错误，不发起任何网络请求。
//! 用于本地联调和测试桥接层的各种结束路径。

use super::traits::{
    AssistantBackend, BackendError, BackendErrorKind, BackendRequest, BackendResult,
};
use crate::models::openai::ModelInfo;
use crate::stream::events::{BackendChunk, ChunkSink};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// 脚本步骤
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// 推送一个 chunk
    Chunk(BackendChunk),
    /// 以错误结束调用
    Fail(String),
}

/// 脚本化后端
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    models: Vec<ModelInfo>,
    steps: Vec<ScriptStep>,
    calls: AtomicUsize,
    delivered: AtomicUsize,
    completed: AtomicUsize,
    last_request: Mutex<Option<BackendRequest>>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            ..Default::default()
        }
    }

    /// 只推送文本 chunk 的脚本
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            texts
                .into_iter()
                .map(|t| ScriptStep::Chunk(BackendChunk::content(t)))
                .collect(),
        )
    }

    pub fn with_models(mut self, models: Vec<ModelInfo>) -> Self {
        self.models = models;
        self
    }

    /// `generate` 被调用的次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 已成功推入通道的 chunk 数
    pub fn delivered_count(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    /// 运行到返回的 `generate` 调用次数；调用被取消时不计入
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// 最近一次收到的请求
    pub fn last_request(&self) -> Option<BackendRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl AssistantBackend for ScriptedBackend {
    async fn list_models(&self) -> BackendResult<Vec<ModelInfo>> {
        Ok(self.models.clone())
    }

    async fn generate(&self, request: BackendRequest, sink: ChunkSink) -> BackendResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(request);
        }

        let result = self.run_steps(&sink).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

impl ScriptedBackend {
    async fn run_steps(&self, sink: &ChunkSink) -> BackendResult<()> {
        for step in &self.steps {
            match step {
                ScriptStep::Chunk(chunk) => {
                    if sink.send(chunk.clone()).await.is_err() {
                        tracing::debug!("[SCRIPTED] 接收端已关闭，停止推送");
                        return Ok(());
                    }
                    self.delivered.fetch_add(1, Ordering::SeqCst);
                }
                ScriptStep::Fail(message) => {
                    return Err(BackendError::new(BackendErrorKind::ServerError, message));
                }
            }
        }
        Ok(())
    }
}
