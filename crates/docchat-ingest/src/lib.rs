//! docchat ingest: text extraction, chunking, document ingestion.

pub mod chunking;
pub mod extract;
pub mod file;
pub mod ingest;

pub use chunking::{WordChunker, DEFAULT_CHUNK_WORDS};
pub use extract::extract_text;
pub use file::DocumentType;
pub use ingest::{IngestSettings, IngestStage, Ingester, Upload};
