//! Retrieval-augmented answering over uploaded documents.
//!
//! `Answerer` embeds the question, retrieves and filters context from the
//! vector store, builds a grounded prompt and streams the model's answer.
//! Generation goes to the Gemini API through the `Generator` trait.

pub mod answer;
pub mod config;
pub mod prompt;
pub mod providers;
pub mod types;

pub use answer::Answerer;
pub use config::AnswerSettings;
pub use providers::{GeminiGenerator, Generator};
pub use types::*;
