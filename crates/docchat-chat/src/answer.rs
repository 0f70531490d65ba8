//! Question answering over the vector store.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::AnswerSettings;
use crate::prompt::build_prompt;
use crate::providers::Generator;
use crate::types::BoxedStream;
use docchat_core::{ChatMessage, Error, Result, SearchResult};
use docchat_infer::EmbedderBackend;
use docchat_store::VectorStore;

pub struct Answerer {
    embedder: Arc<dyn EmbedderBackend>,
    store: Arc<dyn VectorStore>,
    generator: Arc<dyn Generator>,
    settings: AnswerSettings,
}

impl Answerer {
    pub fn new(
        embedder: Arc<dyn EmbedderBackend>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
        settings: AnswerSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
            settings,
        }
    }

    /// Relevant context for a question, best first. Fails with
    /// `InsufficientContext` when nothing clears the relevance threshold.
    pub async fn retrieve(&self, question: &str, document_id: Option<&str>) -> Result<Vec<SearchResult>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }

        let vector = self.embedder.embed(question).await.map_err(|e| match e {
            Error::Embedding(msg) => Error::QuestionEmbedding(msg),
            other => other,
        })?;

        let matches = self
            .store
            .query(&vector, document_id, self.settings.max_contexts)
            .await?;
        let total = matches.len();

        let relevant: Vec<SearchResult> = matches
            .into_iter()
            .filter(|m| m.score >= self.settings.min_relevance_score)
            .collect();

        if relevant.is_empty() {
            info!(document_id, total, "no context above relevance threshold");
            return Err(Error::InsufficientContext);
        }

        for (rank, m) in relevant.iter().enumerate() {
            debug!(rank = rank + 1, id = %m.id, score = m.score, "context");
        }
        Ok(relevant)
    }

    /// Retrieve, build the grounded prompt and start generation. Every
    /// failure up to the first fragment is returned here.
    pub async fn answer(
        &self,
        question: &str,
        document_id: Option<&str>,
        history: &[ChatMessage],
    ) -> Result<BoxedStream> {
        let contexts = self.retrieve(question, document_id).await?;
        let prompt = build_prompt(question, &contexts);

        let start = history.len().saturating_sub(self.settings.max_history_turns);
        let history = &history[start..];

        info!(
            document_id,
            contexts = contexts.len(),
            history = history.len(),
            generator = self.generator.name(),
            "generating answer"
        );
        self.generator.stream(history, prompt).await
    }
}
