//! Embedding backend trait and dimension bookkeeping.
//!
//! Implementations:
//! - `GeminiEmbedder`: Google AI `embedContent` over REST
//! - `CachedEmbedder`: wraps any backend with an LRU/TTL cache

use std::sync::OnceLock;

use async_trait::async_trait;
use docchat_core::{Error, Result};

/// Trait for embedding backends.
///
/// `embed` either returns a full vector of the model's fixed dimension or
/// fails with `Error::Embedding` (or `Error::Config` if credentials are missing).
#[async_trait]
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimension observed so far, if any call has succeeded.
    fn dimension(&self) -> Option<usize>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

/// Pins the vector length on first success and rejects any later
/// vector that disagrees, so similarity comparisons stay valid.
#[derive(Debug, Default)]
pub struct DimensionGuard {
    dim: OnceLock<usize>,
}

impl DimensionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<usize> {
        self.dim.get().copied()
    }

    pub fn check(&self, embedding: &[f32]) -> Result<()> {
        if embedding.is_empty() {
            return Err(Error::Embedding("model returned an empty vector".into()));
        }
        let expected = *self.dim.get_or_init(|| embedding.len());
        if expected != embedding.len() {
            return Err(Error::Embedding(format!(
                "dimension mismatch: expected {}, got {}",
                expected,
                embedding.len()
            )));
        }
        Ok(())
    }
}
