//! Records and statistics exchanged with vector stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored chunk: key, vector and the metadata needed to rebuild a
/// search result.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub text: String,
    pub document_id: String,
    pub created_at: DateTime<Utc>,
}

impl VectorRecord {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        values: Vec<f32>,
        document_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            values,
            text: text.into(),
            document_id: document_id.into(),
            created_at: Utc::now(),
        }
    }

    pub fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            text: self.text.clone(),
            document_id: self.document_id.clone(),
            created_at: Some(self.created_at.to_rfc3339()),
        }
    }
}

/// Metadata stored alongside each vector: `{text, documentId, createdAt}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Store-level statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_records: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}
