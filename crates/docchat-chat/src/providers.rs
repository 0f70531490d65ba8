//! Gemini streaming generation.
//!
//! Uses `models/{model}:streamGenerateContent?alt=sse`. The request is sent
//! and its status checked before a stream is handed back, so rejected
//! requests fail before any fragment reaches the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio_stream::StreamExt;
use tracing::{debug, error, warn};

use crate::types::{BoxedStream, StreamChunk};
use docchat_core::{ChatMessage, Error, Result, Role};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A streaming text generator.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Start generating. `history` holds prior turns, oldest first; `prompt`
    /// becomes the final user turn.
    async fn stream(&self, history: &[ChatMessage], prompt: String) -> Result<BoxedStream>;

    fn name(&self) -> &str;
}

pub struct GeminiGenerator {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    pub fn new(client: Client, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

/// Gemini `contents`: history turns then the prompt. Assistant turns use
/// the `model` role.
fn request_body(history: &[ChatMessage], prompt: &str) -> Value {
    let mut contents: Vec<Value> = history
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": [{ "text": prompt }] }));
    json!({ "contents": contents })
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn stream(&self, history: &[ChatMessage], prompt: String) -> Result<BoxedStream> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("GOOGLE_AI_API_KEY is not set".into()))?;

        debug!(model = %self.model, turns = history.len(), "starting Gemini stream");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request_body(history, &prompt))
            .send()
            .await
            .map_err(|e| Error::Generation(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.model, %status, "generation request rejected");
            return Err(Error::Generation(format!("API error {}: {}", status, body)));
        }

        let mut bytes = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut lines = SseLineBuffer::default();
            let mut fragments = 0usize;

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        yield StreamChunk::Error(format!("Stream read error: {}", e));
                        return;
                    }
                };

                for data in lines.push(&chunk) {
                    match parse_event(&data) {
                        Some(StreamChunk::Token(text)) => {
                            fragments += 1;
                            yield StreamChunk::Token(text);
                        }
                        Some(StreamChunk::Error(msg)) => {
                            warn!(error = %msg, "Gemini stream error");
                            yield StreamChunk::Error(msg);
                            return;
                        }
                        Some(done @ StreamChunk::Done { .. }) => {
                            yield done;
                            return;
                        }
                        None => {}
                    }
                }
            }

            yield StreamChunk::Done { fragments };
        };

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Splits a byte stream into SSE `data:` payloads. Lines may span reads,
/// including reads that end inside a multi-byte character.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();

        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = match std::str::from_utf8(&raw[..line_end]) {
                Ok(s) => s.trim().to_string(),
                Err(e) => {
                    debug!(error = %e, "invalid UTF-8 in SSE line");
                    String::from_utf8_lossy(&raw[..line_end]).trim().to_string()
                }
            };

            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            if let Some(data) = line.strip_prefix("data:") {
                out.push(data.trim_start().to_string());
            }
        }
        out
    }
}

/// Interpret one Gemini SSE payload.
pub fn parse_event(data: &str) -> Option<StreamChunk> {
    if data.trim() == "[DONE]" {
        return Some(StreamChunk::Done { fragments: 0 });
    }
    let parsed: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "skipping unparseable SSE payload");
            return None;
        }
    };

    if let Some(msg) = parsed["error"]["message"].as_str() {
        return Some(StreamChunk::Error(msg.to_string()));
    }
    if let Some(reason) = parsed["promptFeedback"]["blockReason"].as_str() {
        return Some(StreamChunk::Error(format!("prompt blocked: {}", reason)));
    }

    let text: String = parsed["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    if text.is_empty() {
        None
    } else {
        Some(StreamChunk::Token(text))
    }
}
