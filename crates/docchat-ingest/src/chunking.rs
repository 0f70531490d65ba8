//! Word-window chunking.
//!
//! Text is split on runs of whitespace and grouped into windows of exactly
//! `N` words; only the last window may be shorter. Each window is rejoined
//! with single spaces.

/// Default window size in words.
pub const DEFAULT_CHUNK_WORDS: usize = 500;

#[derive(Debug, Clone, Copy)]
pub struct WordChunker {
    words_per_chunk: usize,
}

impl WordChunker {
    /// A window of zero is treated as one word.
    pub fn new(words_per_chunk: usize) -> Self {
        Self {
            words_per_chunk: words_per_chunk.max(1),
        }
    }

    pub fn words_per_chunk(&self) -> usize {
        self.words_per_chunk
    }

    /// Ordered, non-empty chunk texts. Empty only when `text` has no
    /// non-whitespace content.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        words
            .chunks(self.words_per_chunk)
            .map(|window| window.join(" "))
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_WORDS)
    }
}
