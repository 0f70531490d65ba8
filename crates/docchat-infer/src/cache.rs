//! LRU cache in front of an embedding backend.
//!
//! Repeated questions (and re-uploads of the same text) skip the network
//! call. Default: 1000 entries, 1-hour TTL.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use crate::embedder::EmbedderBackend;
use docchat_core::Result;

struct CacheEntry {
    embedding: Vec<f32>,
    inserted_at: Instant,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Least recently used at the front.
    order: VecDeque<String>,
    max_size: usize,
    ttl: Duration,
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

/// Thread-safe embedding cache wrapping another backend.
pub struct CachedEmbedder {
    inner: Arc<dyn EmbedderBackend>,
    cache: Mutex<CacheInner>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn EmbedderBackend>, max_size: usize, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size),
                order: VecDeque::with_capacity(max_size),
                max_size,
                ttl,
            }),
        }
    }

    /// 1000 entries, 1 hour.
    pub fn with_defaults(inner: Arc<dyn EmbedderBackend>) -> Self {
        Self::new(inner, 1000, Duration::from_secs(3600))
    }

    fn get(&self, text: &str) -> Option<Vec<f32>> {
        let mut cache = self.cache.lock();
        let ttl = cache.ttl;
        let expired = cache.entries.get(text).map(|e| e.inserted_at.elapsed() >= ttl)?;

        if expired {
            cache.remove(text);
            return None;
        }

        let embedding = cache.entries.get(text).map(|e| e.embedding.clone());
        cache.touch(text);
        embedding
    }

    fn put(&self, text: &str, embedding: Vec<f32>) {
        let mut cache = self.cache.lock();
        if cache.max_size == 0 {
            return;
        }

        if cache.entries.contains_key(text) {
            cache.touch(text);
        } else {
            while cache.entries.len() >= cache.max_size {
                match cache.order.pop_front() {
                    Some(oldest) => {
                        cache.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
            cache.order.push_back(text.to_string());
        }

        cache.entries.insert(
            text.to_string(),
            CacheEntry {
                embedding,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.cache.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EmbedderBackend for CachedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(hit) = self.get(text) {
            trace!(text_len = text.len(), "embedding cache hit");
            return Ok(hit);
        }
        let embedding = self.inner.embed(text).await?;
        self.put(text, embedding.clone());
        Ok(embedding)
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbedderBackend for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimension(&self) -> Option<usize> {
            Some(2)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_hit_skips_backend() {
        let backend = Arc::new(CountingEmbedder::default());
        let cached = CachedEmbedder::with_defaults(backend.clone());

        let a = cached.embed("what is rust").await.unwrap();
        let b = cached.embed("what is rust").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let backend = Arc::new(CountingEmbedder::default());
        let cached = CachedEmbedder::new(backend.clone(), 2, Duration::from_secs(60));

        cached.embed("a").await.unwrap();
        cached.embed("b").await.unwrap();
        cached.embed("a").await.unwrap(); // refresh "a"
        cached.embed("c").await.unwrap(); // evicts "b"
        assert_eq!(cached.len(), 2);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);

        cached.embed("a").await.unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        cached.embed("b").await.unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let backend = Arc::new(CountingEmbedder::default());
        let cached = CachedEmbedder::new(backend.clone(), 10, Duration::ZERO);

        cached.embed("x").await.unwrap();
        cached.embed("x").await.unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }
}
