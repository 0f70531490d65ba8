//! Vector store trait.

use async_trait::async_trait;

use crate::types::{IndexStats, VectorRecord};
use docchat_core::{Result, SearchResult};

/// A vector index holding one record per chunk.
///
/// Transport and infrastructure failures surface as
/// `Error::StoreUnavailable`; rejected operations as `Error::Upsert`,
/// `Error::Query` or `Error::Delete`. An empty result is never an error.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store or overwrite the record keyed by `record.id`.
    async fn upsert(&self, record: VectorRecord) -> Result<()>;

    /// Up to `top_k` records ordered by descending similarity, restricted
    /// to `document_id` when given.
    async fn query(
        &self,
        vector: &[f32],
        document_id: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Remove every record of a document. Returns how many were removed;
    /// zero for an unknown id.
    async fn delete_document(&self, document_id: &str) -> Result<usize>;

    async fn stats(&self) -> Result<IndexStats>;

    fn name(&self) -> &str;
}
