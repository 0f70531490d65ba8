//! Document upload.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::debug;

use crate::error::{ApiError, Envelope};
use crate::state::AppState;
use docchat_core::Error;
use docchat_ingest::Upload;

/// Multipart field carrying the document.
const FILE_FIELD: &str = "file";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/upload", post(upload))
}

/// POST /upload: ingest one document from the `file` field.
async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let fail = |e: Error| ApiError::new(e, Envelope::Data);

    let mut multipart = multipart.map_err(|e| fail(Error::InvalidFile(e.body_text())))?;
    let upload = read_file_field(&mut multipart).await.map_err(fail)?;

    let document = state.ingester.ingest(upload).await.map_err(fail)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "documentId": document.id,
                "name": document.name,
                "size": document.size,
                "chunkCount": document.chunk_count,
            },
            "error": null,
        })),
    ))
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Upload, Error> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| Error::InvalidFile(e.body_text()))?
            .ok_or_else(|| Error::InvalidFile("no file was provided".into()))?;

        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "skipping multipart field");
            continue;
        }

        let name = field
            .file_name()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Unknown file")
            .to_string();
        let mime_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidFile(e.body_text()))?;

        return Ok(Upload {
            name,
            mime_type,
            bytes: bytes.to_vec(),
        });
    }
}
