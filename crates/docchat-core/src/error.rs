//! Error types for docchat.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("No text could be extracted from the document")]
    EmptyDocument,

    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not enough relevant information was found in the documents to answer this question")]
    InsufficientContext,

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Question embedding failed: {0}")]
    QuestionEmbedding(String),

    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Upsert failed: {0}")]
    Upsert(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Delete failed: {0}")]
    Delete(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input from the caller. Reported verbatim.
    Validation,
    /// No relevant context for the question.
    NotFound,
    /// An embedding, generation or vector-store call failed.
    Upstream,
    /// Missing or invalid credentials/settings.
    Configuration,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFile(_)
            | Self::UnsupportedType(_)
            | Self::ExtractionFailed(_)
            | Self::EmptyDocument
            | Self::EmptyQuestion
            | Self::InvalidRequest(_) => ErrorKind::Validation,
            Self::InsufficientContext => ErrorKind::NotFound,
            Self::Config(_) => ErrorKind::Configuration,
            Self::Embedding(_)
            | Self::QuestionEmbedding(_)
            | Self::StoreUnavailable(_)
            | Self::Upsert(_)
            | Self::Query(_)
            | Self::Delete(_)
            | Self::Generation(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Http(_)
            | Self::Internal(_) => ErrorKind::Upstream,
        }
    }

    /// Message safe to show to the caller. Upstream and configuration
    /// detail stays in the server log.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::NotFound => self.to_string(),
            ErrorKind::Configuration => "The server is not configured correctly".into(),
            ErrorKind::Upstream => match self {
                Self::Embedding(_) | Self::QuestionEmbedding(_) => {
                    "The embedding service failed to process the request".into()
                }
                Self::StoreUnavailable(_) | Self::Upsert(_) | Self::Query(_) | Self::Delete(_) => {
                    "The vector store failed to process the request".into()
                }
                Self::Generation(_) => "The language model failed to generate an answer".into(),
                _ => "An internal error occurred".into(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
