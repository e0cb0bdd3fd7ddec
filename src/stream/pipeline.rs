//! 桥接管道
//!
//! 将一次回调式后端调用转换为有序的 `BridgeEvent` 流，再按模式输出：
//!
//! ```text
//! AssistantBackend::generate ──ChunkSink──> drive_backend ──BridgeEvent──┬─> sse_frames ──> SSE 帧
//!                                                                        └─> collect_response ──> JSON
//! ```
//!
//! 所有 chunk 事件都排在 `Finished` 之前；`Finished` 恰好出现一次且最后出现。

use crate::backends::{AssistantBackend, BackendError, BackendRequest};
use crate::models::openai::ChatCompletionResponse;
use crate::stream::accumulator::Accumulator;
use crate::stream::envelope::ResponseEnvelope;
use crate::stream::events::{BackendChunk, BridgeEvent, ChunkSink};
use crate::stream::generators::OpenAiSseGenerator;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// 桥接事件流
pub type EventStream = BoxStream<'static, BridgeEvent>;

enum Step {
    Chunk(Option<BackendChunk>),
    Done(Result<(), BackendError>),
}

/// 驱动一次后端调用
///
/// 后端调用与 chunk 接收在同一个任务中交替推进。流被丢弃时后端调用随之取消。
pub fn drive_backend(backend: Arc<dyn AssistantBackend>, request: BackendRequest) -> EventStream {
    let stream = async_stream::stream! {
        let (sink, mut rx) = ChunkSink::channel();
        let mut call = backend.generate(request, sink);

        let result = loop {
            let step = tokio::select! {
                biased;
                chunk = rx.recv() => Step::Chunk(chunk),
                result = &mut call => Step::Done(result),
            };
            match step {
                Step::Chunk(Some(chunk)) => yield BridgeEvent::Chunk(chunk),
                // sink 已释放，剩下的只有调用结果
                Step::Chunk(None) => break (&mut call).await,
                Step::Done(result) => break result,
            }
        };
        drop(call);

        while let Some(chunk) = rx.recv().await {
            yield BridgeEvent::Chunk(chunk);
        }

        debug!("[BRIDGE] 后端 {} 调用结束: ok={}", backend.name(), result.is_ok());
        yield BridgeEvent::Finished(result);
    };
    stream.boxed()
}

/// 等待第一个事件后再返回帧流
///
/// 返回时即提交响应头；后端在此之前失败会走流式错误路径。
pub async fn commit_sse_stream(
    mut events: EventStream,
    envelope: ResponseEnvelope,
) -> impl Stream<Item = String> + Send + 'static {
    let first = events.next().await;
    sse_frames(stream::iter(first).chain(events), envelope)
}

/// 将事件流转换为 OpenAI SSE 帧
pub fn sse_frames<S>(
    events: S,
    envelope: ResponseEnvelope,
) -> impl Stream<Item = String> + Send + 'static
where
    S: Stream<Item = BridgeEvent> + Send + 'static,
{
    async_stream::stream! {
        let mut generator = OpenAiSseGenerator::new(envelope);
        let mut committed = false;
        let mut events = std::pin::pin!(events);

        while let Some(event) = events.next().await {
            match event {
                BridgeEvent::Chunk(chunk) => {
                    committed = true;
                    yield generator.generate(&chunk);
                }
                BridgeEvent::Finished(Ok(())) => {
                    yield generator.generate_finish();
                    yield generator.generate_done();
                    return;
                }
                BridgeEvent::Finished(Err(e)) if !committed => {
                    warn!("[BRIDGE] 后端在输出前失败: {}", e);
                    yield generator.generate_error(&e.message);
                    yield generator.generate_finish();
                    yield generator.generate_done();
                    return;
                }
                BridgeEvent::Finished(Err(e)) => {
                    // 已有部分输出，只记录日志，不再补发任何帧
                    error!(
                        "[BRIDGE] 后端在流式输出中途失败 id={}: {}",
                        generator.envelope().id,
                        e
                    );
                    return;
                }
            }
        }
    }
}

/// 非流式模式：累积全部 chunk，生成单个响应
pub async fn collect_response<S>(
    events: S,
    envelope: &ResponseEnvelope,
) -> Result<ChatCompletionResponse, BackendError>
where
    S: Stream<Item = BridgeEvent>,
{
    let mut accumulator = Accumulator::new();
    let mut events = std::pin::pin!(events);

    while let Some(event) = events.next().await {
        match event {
            BridgeEvent::Chunk(chunk) => accumulator.push(chunk),
            BridgeEvent::Finished(result) => {
                result?;
                break;
            }
        }
    }
    Ok(accumulator.into_response(envelope))
}
