//! docchat core: domain types, error taxonomy, configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DocChatConfig, VectorBackend};
pub use error::{Error, ErrorKind, Result};
pub use types::{ChatMessage, Chunk, Document, Role, SearchResult};
