//! docchat store: vector index backends.
//!
//! `PineconeStore` talks to a hosted Pinecone index over REST;
//! `MemoryStore` keeps everything in process for development and tests.

pub mod memory;
pub mod pinecone;
pub mod store;
pub mod types;

pub use memory::MemoryStore;
pub use pinecone::PineconeStore;
pub use store::VectorStore;
pub use types::{IndexStats, VectorRecord};

use std::sync::Arc;

use docchat_core::{DocChatConfig, VectorBackend};

/// Build the store selected by `VECTOR_BACKEND`.
pub fn create_store(config: &DocChatConfig, client: reqwest::Client) -> Arc<dyn VectorStore> {
    match config.vector_backend {
        VectorBackend::Memory => {
            tracing::warn!("Using in-memory vector store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        VectorBackend::Pinecone => {
            if config.pinecone_api_key.is_none() || config.pinecone_index.is_none() {
                tracing::warn!("Pinecone credentials incomplete; store operations will fail");
            }
            tracing::info!(
                "Using Pinecone store (index={})",
                config.pinecone_index.as_deref().unwrap_or("<unset>")
            );
            Arc::new(PineconeStore::new(
                client,
                config.pinecone_api_key.clone(),
                config.pinecone_index.clone(),
                config.pinecone_host.clone(),
            ))
        }
    }
}
