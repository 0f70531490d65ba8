//! Domain types shared by ingestion, retrieval and the HTTP boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded document. Exists only as the result of a completed upload;
/// the vector store holds its chunks, nothing else is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    pub size: usize,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub chunk_count: usize,
}

/// Generate a fresh opaque document id.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A contiguous slice of a document's text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// `{document_id}_chunk_{index}`.
    pub id: String,
    pub document_id: String,
    pub index: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn new(document_id: &str, index: usize, text: String) -> Self {
        Self {
            id: chunk_id(document_id, index),
            document_id: document_id.to_string(),
            index,
            text,
            embedding: None,
        }
    }
}

/// Build the vector-store key for a chunk.
pub fn chunk_id(document_id: &str, index: usize) -> String {
    format!("{}_chunk_{}", document_id, index)
}

/// Prefix shared by every chunk id of a document.
pub fn chunk_id_prefix(document_id: &str) -> String {
    format!("{}_chunk_", document_id)
}

/// A similarity match returned by the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    /// Higher is more similar.
    pub score: f32,
    pub text: String,
    pub document_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of a conversation. Held by the client and sent back with
/// each question; the server never stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}
