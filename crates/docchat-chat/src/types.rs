//! Chat request and streaming types.

use std::pin::Pin;

use futures::Stream;
use serde::Deserialize;

use docchat_core::ChatMessage;

/// Boxed stream of generation fragments.
pub type BoxedStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// A single streamed fragment, end marker or terminal error.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Token(String),
    Done { fragments: usize },
    Error(String),
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub document_id: Option<String>,
    /// Earlier turns, held by the client.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Document scope; blank ids mean the whole index.
    pub fn scope(&self) -> Option<&str> {
        self.document_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
