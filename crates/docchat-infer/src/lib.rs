//! docchat infer: embedding backends.
//!
//! Provides the `EmbedderBackend` trait for generating embeddings.
//! `GeminiEmbedder` calls the Google AI `embedContent` endpoint;
//! `CachedEmbedder` memoises results for repeated texts.

pub mod cache;
pub mod embedder;
pub mod gemini;

pub use cache::CachedEmbedder;
pub use embedder::{DimensionGuard, EmbedderBackend};
pub use gemini::GeminiEmbedder;

use std::sync::Arc;

use docchat_core::DocChatConfig;

/// Create the configured embedder, wrapped in the default cache.
pub fn create_embedder(config: &DocChatConfig, client: reqwest::Client) -> Arc<dyn EmbedderBackend> {
    if config.google_api_key.is_none() {
        tracing::warn!("GOOGLE_AI_API_KEY is not set; embedding calls will fail");
    }
    let gemini = GeminiEmbedder::new(
        client,
        config.google_api_key.clone(),
        config.embedding_model.clone(),
    );
    tracing::info!("Using Gemini embedder (model={})", config.embedding_model);
    Arc::new(CachedEmbedder::with_defaults(Arc::new(gemini)))
}
