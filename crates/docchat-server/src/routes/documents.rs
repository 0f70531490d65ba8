//! Document deletion.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::delete;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, Envelope};
use crate::state::AppState;
use docchat_core::Error;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/delete", delete(delete_document))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest {
    #[serde(default)]
    document_id: Option<String>,
}

/// DELETE /delete: remove every chunk of a document. Unknown ids succeed.
async fn delete_document(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let fail = |e: Error| ApiError::new(e, Envelope::Message);

    let Json(req) = body.map_err(|e| fail(Error::InvalidRequest(e.body_text())))?;
    let document_id = req
        .document_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| fail(Error::InvalidRequest("documentId must not be empty".into())))?;

    let removed = state.store.delete_document(document_id).await.map_err(fail)?;
    info!(document_id, removed, "document deleted");

    Ok(Json(json!({
        "success": true,
        "message": "Document deleted successfully",
        "deletedChunks": removed,
    })))
}
