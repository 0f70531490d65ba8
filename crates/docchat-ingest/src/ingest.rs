//! Upload ingestion: bytes → text → chunks → embeddings → vector store.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, error, info, warn};

use crate::chunking::WordChunker;
use crate::extract::extract_text;
use crate::file::DocumentType;
use docchat_core::types::new_document_id;
use docchat_core::{Chunk, DocChatConfig, Document, Error, Result};
use docchat_infer::EmbedderBackend;
use docchat_store::{VectorRecord, VectorStore};

/// Per-upload state. `Failed` is reachable from every stage and is
/// reported by logging the stage that was active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Received,
    Validated,
    Extracted,
    Chunked,
    Embedding,
    Stored,
    Complete,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Extracted => "extracted",
            Self::Chunked => "chunked",
            Self::Embedding => "embedding",
            Self::Stored => "stored",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// A file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    /// Declared content type, if the client sent one.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub max_upload_bytes: usize,
    pub chunk_words: usize,
    pub concurrency: usize,
    pub rollback_partial_uploads: bool,
}

impl From<&DocChatConfig> for IngestSettings {
    fn from(config: &DocChatConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            chunk_words: config.chunk_words,
            concurrency: config.ingest_concurrency,
            rollback_partial_uploads: config.rollback_partial_uploads,
        }
    }
}

/// Runs uploads through extraction, chunking and concurrent
/// embed-and-store.
pub struct Ingester {
    embedder: Arc<dyn EmbedderBackend>,
    store: Arc<dyn VectorStore>,
    settings: IngestSettings,
}

impl Ingester {
    pub fn new(
        embedder: Arc<dyn EmbedderBackend>,
        store: Arc<dyn VectorStore>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Check type and size before any work is done.
    pub fn validate(&self, upload: &Upload) -> Result<DocumentType> {
        let kind = DocumentType::detect(upload.mime_type.as_deref(), &upload.name).ok_or_else(|| {
            Error::InvalidFile(format!(
                "unsupported type {}; expected PDF, DOCX or plain text",
                upload.mime_type.as_deref().unwrap_or("(none)")
            ))
        })?;

        if upload.bytes.len() > self.settings.max_upload_bytes {
            return Err(Error::InvalidFile(format!(
                "file is {} bytes; the limit is {} bytes",
                upload.bytes.len(),
                self.settings.max_upload_bytes
            )));
        }
        Ok(kind)
    }

    /// Ingest one upload. All chunks are stored or the upload fails.
    pub async fn ingest(&self, upload: Upload) -> Result<Document> {
        let mut stage = IngestStage::Received;
        debug!(name = %upload.name, size = upload.bytes.len(), %stage, "upload received");

        let kind = match self.validate(&upload) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(name = %upload.name, %stage, error = %e, "upload rejected");
                return Err(e);
            }
        };
        stage = IngestStage::Validated;
        let document_id = new_document_id();
        debug!(%document_id, %kind, %stage, "upload validated");

        let name = upload.name;
        let size = upload.bytes.len();

        let text = match extract_blocking(upload.bytes, kind).await {
            Ok(text) => text,
            Err(e) => {
                warn!(%document_id, %stage, error = %e, "extraction failed");
                return Err(e);
            }
        };
        stage = IngestStage::Extracted;
        debug!(%document_id, chars = text.len(), %stage, "text extracted");

        let texts = WordChunker::new(self.settings.chunk_words).chunk(&text);
        if texts.is_empty() {
            warn!(%document_id, %stage, "no text in document");
            return Err(Error::EmptyDocument);
        }
        stage = IngestStage::Chunked;
        let chunk_count = texts.len();
        debug!(%document_id, chunk_count, %stage, "document chunked");

        let chunks: Vec<Chunk> = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk::new(&document_id, index, text))
            .collect();

        stage = IngestStage::Embedding;
        debug!(%document_id, concurrency = self.settings.concurrency, %stage, "embedding chunks");
        if let Err(e) = self.store_chunks(chunks).await {
            error!(%document_id, %stage, error = %e, "upload failed");
            if self.settings.rollback_partial_uploads {
                self.rollback(&document_id).await;
            }
            return Err(e);
        }
        stage = IngestStage::Stored;
        debug!(%document_id, chunk_count, %stage, "chunks stored");

        stage = IngestStage::Complete;
        info!(%document_id, %name, size, chunk_count, %stage, "document ingested");
        Ok(Document {
            id: document_id,
            name,
            size,
            mime_type: kind.mime_type().to_string(),
            uploaded_at: Utc::now(),
            chunk_count,
        })
    }

    /// Embed and upsert every chunk with bounded concurrency. The first
    /// failure drops the in-flight operations.
    async fn store_chunks(&self, chunks: Vec<Chunk>) -> Result<()> {
        stream::iter(chunks)
            .map(|chunk| self.store_chunk(chunk))
            .buffer_unordered(self.settings.concurrency.max(1))
            .try_collect::<Vec<()>>()
            .await?;
        Ok(())
    }

    async fn store_chunk(&self, chunk: Chunk) -> Result<()> {
        let values = self.embedder.embed(&chunk.text).await?;
        let record = VectorRecord::new(chunk.id, chunk.text, values, chunk.document_id);
        self.store.upsert(record).await
    }

    async fn rollback(&self, document_id: &str) {
        match self.store.delete_document(document_id).await {
            Ok(removed) => info!(document_id, removed, "rolled back partial upload"),
            Err(e) => warn!(document_id, error = %e, "rollback of partial upload failed"),
        }
    }
}

async fn extract_blocking(bytes: Vec<u8>, kind: DocumentType) -> Result<String> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, kind))
        .await
        .map_err(|e| Error::ExtractionFailed(format!("extractor task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docchat_store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder: vector derived from text length, optionally
    /// failing after a number of calls.
    struct FakeEmbedder {
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl FakeEmbedder {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0), fail_after: None }
        }

        fn failing_after(n: usize) -> Self {
            Self { calls: AtomicUsize::new(0), fail_after: Some(n) }
        }
    }

    #[async_trait]
    impl EmbedderBackend for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| n >= limit) {
                return Err(Error::Embedding("quota exceeded".into()));
            }
            Ok(vec![1.0, text.len() as f32])
        }

        fn dimension(&self) -> Option<usize> {
            Some(2)
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn settings() -> IngestSettings {
        IngestSettings {
            max_upload_bytes: 1024 * 1024,
            chunk_words: 500,
            concurrency: 4,
            rollback_partial_uploads: false,
        }
    }

    fn text_upload(words: usize) -> Upload {
        let body = (0..words).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ");
        Upload {
            name: "notes.txt".into(),
            mime_type: Some("text/plain".into()),
            bytes: body.into_bytes(),
        }
    }

    #[tokio::test]
    async fn test_ingest_1200_words_yields_three_chunks() {
        let store = Arc::new(MemoryStore::new());
        let ingester = Ingester::new(Arc::new(FakeEmbedder::new()), store.clone(), settings());

        let doc = ingester.ingest(text_upload(1200)).await.unwrap();
        assert_eq!(doc.chunk_count, 3);
        assert_eq!(doc.name, "notes.txt");
        assert_eq!(doc.mime_type, "text/plain");
        assert_eq!(store.len().await, 3);

        for i in 0..3 {
            let record = store.get(&format!("{}_chunk_{}", doc.id, i)).await.unwrap();
            assert_eq!(record.document_id, doc.id);
            assert!(!record.text.is_empty());
        }
    }

    #[tokio::test]
    async fn test_rejects_unsupported_type() {
        let ingester = Ingester::new(Arc::new(FakeEmbedder::new()), Arc::new(MemoryStore::new()), settings());
        let upload = Upload {
            name: "photo.png".into(),
            mime_type: Some("image/png".into()),
            bytes: vec![1, 2, 3],
        };
        let err = ingester.ingest(upload).await.unwrap_err();
        assert!(matches!(err, Error::InvalidFile(_)));
    }

    #[tokio::test]
    async fn test_rejects_oversize_file() {
        let mut s = settings();
        s.max_upload_bytes = 10;
        let ingester = Ingester::new(Arc::new(FakeEmbedder::new()), Arc::new(MemoryStore::new()), s);
        let err = ingester.ingest(text_upload(50)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidFile(_)));
    }

    #[tokio::test]
    async fn test_whitespace_document_is_empty() {
        let ingester = Ingester::new(Arc::new(FakeEmbedder::new()), Arc::new(MemoryStore::new()), settings());
        let upload = Upload {
            name: "blank.txt".into(),
            mime_type: Some("text/plain".into()),
            bytes: b"   \n\t ".to_vec(),
        };
        assert!(matches!(ingester.ingest(upload).await.unwrap_err(), Error::EmptyDocument));
    }

    #[tokio::test]
    async fn test_zero_byte_text_file_is_empty_document() {
        let store = Arc::new(MemoryStore::new());
        let ingester = Ingester::new(Arc::new(FakeEmbedder::new()), store.clone(), settings());
        let upload = Upload {
            name: "a.txt".into(),
            mime_type: Some("text/plain".into()),
            bytes: Vec::new(),
        };
        assert!(matches!(ingester.ingest(upload).await.unwrap_err(), Error::EmptyDocument));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_embedding_failure_fails_whole_upload() {
        let store = Arc::new(MemoryStore::new());
        let mut s = settings();
        s.concurrency = 1;
        let ingester = Ingester::new(Arc::new(FakeEmbedder::failing_after(1)), store.clone(), s);

        let err = ingester.ingest(text_upload(1200)).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        // No rollback by default: the first chunk stays.
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_rollback_removes_partial_chunks() {
        let store = Arc::new(MemoryStore::new());
        let mut s = settings();
        s.concurrency = 1;
        s.rollback_partial_uploads = true;
        let ingester = Ingester::new(Arc::new(FakeEmbedder::failing_after(2)), store.clone(), s);

        assert!(ingester.ingest(text_upload(1500)).await.is_err());
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(IngestStage::Embedding.to_string(), "embedding");
        assert_eq!(IngestStage::Complete.to_string(), "complete");
    }
}
