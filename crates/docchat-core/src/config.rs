//! Configuration loaded from the environment.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.0-flash-exp";
/// 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_CHUNK_WORDS: usize = 500;
pub const DEFAULT_MIN_RELEVANCE_SCORE: f32 = 0.5;
pub const DEFAULT_MAX_CONTEXTS: usize = 5;
pub const DEFAULT_INGEST_CONCURRENCY: usize = 16;

/// Which vector store implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Pinecone,
    /// Process-local store, lost on restart. Development only.
    Memory,
}

impl std::str::FromStr for VectorBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pinecone" => Ok(Self::Pinecone),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Config(format!("unknown VECTOR_BACKEND: {}", other))),
        }
    }
}

/// Top-level docchat configuration.
///
/// Credentials are optional here: a missing key only fails the first
/// request that needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocChatConfig {
    /// HTTP server port.
    pub port: u16,
    #[serde(skip_serializing)]
    pub google_api_key: Option<String>,
    pub embedding_model: String,
    pub generation_model: String,
    #[serde(skip_serializing)]
    pub pinecone_api_key: Option<String>,
    pub pinecone_index: Option<String>,
    /// Data-plane host of the index. Looked up from the control plane when unset.
    pub pinecone_host: Option<String>,
    pub vector_backend: VectorBackend,
    pub max_upload_bytes: usize,
    /// Words per chunk window.
    pub chunk_words: usize,
    pub min_relevance_score: f32,
    /// Top-K for retrieval.
    pub max_contexts: usize,
    /// Upper bound on in-flight embed+upsert operations per upload.
    pub ingest_concurrency: usize,
    /// Delete already-stored chunks when an upload fails part way.
    pub rollback_partial_uploads: bool,
}

impl Default for DocChatConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            google_api_key: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.into(),
            generation_model: DEFAULT_GENERATION_MODEL.into(),
            pinecone_api_key: None,
            pinecone_index: None,
            pinecone_host: None,
            vector_backend: VectorBackend::Pinecone,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            chunk_words: DEFAULT_CHUNK_WORDS,
            min_relevance_score: DEFAULT_MIN_RELEVANCE_SCORE,
            max_contexts: DEFAULT_MAX_CONTEXTS,
            ingest_concurrency: DEFAULT_INGEST_CONCURRENCY,
            rollback_partial_uploads: false,
        }
    }
}

impl DocChatConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let config = Self {
            port: parse_or(var("PORT"), "PORT", defaults.port)?,
            google_api_key: var("GOOGLE_AI_API_KEY"),
            embedding_model: var("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            generation_model: var("GENERATION_MODEL").unwrap_or(defaults.generation_model),
            pinecone_api_key: var("PINECONE_API_KEY"),
            pinecone_index: var("PINECONE_INDEX_NAME"),
            pinecone_host: var("PINECONE_HOST"),
            vector_backend: match var("VECTOR_BACKEND") {
                Some(v) => v.parse()?,
                None => defaults.vector_backend,
            },
            max_upload_bytes: parse_or(
                var("MAX_UPLOAD_BYTES"),
                "MAX_UPLOAD_BYTES",
                defaults.max_upload_bytes,
            )?,
            chunk_words: parse_or(var("CHUNK_WORDS"), "CHUNK_WORDS", defaults.chunk_words)?,
            min_relevance_score: parse_or(
                var("MIN_RELEVANCE_SCORE"),
                "MIN_RELEVANCE_SCORE",
                defaults.min_relevance_score,
            )?,
            max_contexts: parse_or(var("MAX_CONTEXTS"), "MAX_CONTEXTS", defaults.max_contexts)?,
            ingest_concurrency: parse_or(
                var("INGEST_CONCURRENCY"),
                "INGEST_CONCURRENCY",
                defaults.ingest_concurrency,
            )?,
            rollback_partial_uploads: parse_or(
                var("ROLLBACK_PARTIAL_UPLOADS"),
                "ROLLBACK_PARTIAL_UPLOADS",
                defaults.rollback_partial_uploads,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_words == 0 {
            return Err(Error::Config("CHUNK_WORDS must be at least 1".into()));
        }
        if self.max_contexts == 0 {
            return Err(Error::Config("MAX_CONTEXTS must be at least 1".into()));
        }
        if self.ingest_concurrency == 0 {
            return Err(Error::Config("INGEST_CONCURRENCY must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("invalid value for {}: {:?}", key, raw))),
        None => Ok(default),
    }
}
