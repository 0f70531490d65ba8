//! Shared application state.

use std::sync::Arc;

use docchat_chat::{AnswerSettings, Answerer, GeminiGenerator, Generator};
use docchat_core::DocChatConfig;
use docchat_infer::EmbedderBackend;
use docchat_ingest::{IngestSettings, Ingester};
use docchat_store::VectorStore;

/// Shared application state accessible from all route handlers.
///
/// Holds no per-request data; the vector store is the only shared
/// resource.
pub struct AppState {
    pub config: DocChatConfig,
    pub store: Arc<dyn VectorStore>,
    pub ingester: Ingester,
    pub answerer: Answerer,
}

impl AppState {
    pub fn new(
        config: DocChatConfig,
        embedder: Arc<dyn EmbedderBackend>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let ingester = Ingester::new(
            embedder.clone(),
            store.clone(),
            IngestSettings::from(&config),
        );
        let answerer = Answerer::new(
            embedder,
            store.clone(),
            generator,
            AnswerSettings::from(&config),
        );
        Self {
            config,
            store,
            ingester,
            answerer,
        }
    }

    /// Wire the Gemini clients and the configured vector store.
    pub fn from_config(config: DocChatConfig) -> Self {
        let client = reqwest::Client::new();
        let embedder = docchat_infer::create_embedder(&config, client.clone());
        let store = docchat_store::create_store(&config, client.clone());
        let generator: Arc<dyn Generator> = Arc::new(GeminiGenerator::new(
            client,
            config.google_api_key.clone(),
            config.generation_model.clone(),
        ));
        Self::new(config, embedder, store, generator)
    }
}
