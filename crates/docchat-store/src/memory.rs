//! In-memory vector store using cosine similarity.
//!
//! Records live in a `HashMap` behind a `tokio::sync::RwLock`. Nothing is
//! persisted; used for local development and tests.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::VectorStore;
use crate::types::{IndexStats, VectorRecord};
use docchat_core::{Error, Result, SearchResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<VectorRecord> {
        self.records.read().await.get(id).cloned()
    }
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn upsert(&self, record: VectorRecord) -> Result<()> {
        if record.values.is_empty() {
            return Err(Error::Upsert(format!("record {} has no vector", record.id)));
        }
        let mut records = self.records.write().await;
        if let Some(dim) = records.values().next().map(|r| r.values.len()) {
            if dim != record.values.len() && !records.contains_key(&record.id) {
                return Err(Error::Upsert(format!(
                    "vector dimension {} does not match index dimension {}",
                    record.values.len(),
                    dim
                )));
            }
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        document_id: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let records = self.records.read().await;

        let mut scored: Vec<SearchResult> = records
            .values()
            .filter(|r| document_id.map_or(true, |id| r.document_id == id))
            .map(|r| SearchResult {
                id: r.id.clone(),
                score: cosine_similarity(&r.values, vector),
                text: r.text.clone(),
                document_id: r.document_id.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.document_id != document_id);
        let removed = before - records.len();
        debug!(document_id, removed, "deleted document records");
        Ok(removed)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let records = self.records.read().await;
        Ok(IndexStats {
            total_records: records.len() as u64,
            dimension: records.values().next().map(|r| r.values.len()),
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
