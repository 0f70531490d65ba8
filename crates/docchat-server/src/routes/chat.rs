//! Chat route: grounded answers streamed as server-sent events.
//!
//! Each fragment is sent as `data: {"content": ...}`; the stream ends with
//! `data: [DONE]`. A failure after streaming has started is sent as
//! `data: {"error": ...}` and the stream is closed without `[DONE]`.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::routing::post;
use axum::{Json, Router};
use futures::Stream;
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{error, info};

use crate::error::{ApiError, Envelope};
use crate::state::AppState;
use docchat_chat::{BoxedStream, ChatRequest, StreamChunk};
use docchat_core::Error;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

/// Sent to the client when generation fails mid-stream; detail is logged.
const STREAM_FAILURE_MESSAGE: &str = "The language model failed while generating the answer";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

/// POST /chat: answer a question from the uploaded documents.
async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<SseStream>, ApiError> {
    let fail = |e: Error| ApiError::new(e, Envelope::Data);

    let Json(req) = body.map_err(|e| fail(Error::InvalidRequest(e.body_text())))?;
    let document_id = req.scope().map(str::to_string);

    let generation = state
        .answerer
        .answer(&req.question, document_id.as_deref(), &req.history)
        .await
        .map_err(fail)?;

    Ok(Sse::new(to_sse(generation, document_id)))
}

fn to_sse(mut generation: BoxedStream, document_id: Option<String>) -> SseStream {
    let start = Instant::now();

    Box::pin(async_stream::stream! {
        let mut fragments = 0usize;

        while let Some(chunk) = generation.next().await {
            match chunk {
                StreamChunk::Token(text) => {
                    fragments += 1;
                    yield Ok::<_, Infallible>(Event::default().data(json!({ "content": text }).to_string()));
                }
                StreamChunk::Done { .. } => break,
                StreamChunk::Error(detail) => {
                    error!(document_id = ?document_id, fragments, error = %detail, "generation failed mid-stream");
                    yield Ok(Event::default().data(json!({ "error": STREAM_FAILURE_MESSAGE }).to_string()));
                    return;
                }
            }
        }

        info!(
            document_id = ?document_id,
            fragments,
            duration_ms = start.elapsed().as_millis() as u64,
            "answer streamed"
        );
        yield Ok(Event::default().data("[DONE]"));
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(chunks: Vec<StreamChunk>) -> Vec<Result<Event, Infallible>> {
        to_sse(Box::pin(futures::stream::iter(chunks)), None).collect().await
    }

    #[tokio::test]
    async fn test_done_closes_stream() {
        let events = collect(vec![
            StreamChunk::Token("a".into()),
            StreamChunk::Done { fragments: 1 },
            StreamChunk::Token("ignored".into()),
        ])
        .await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_error_has_no_done_marker() {
        let events = collect(vec![StreamChunk::Token("a".into()), StreamChunk::Error("boom".into())]).await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_stream_still_ends_with_done() {
        let events = collect(vec![StreamChunk::Token("a".into())]).await;
        assert_eq!(events.len(), 2);
    }
}
