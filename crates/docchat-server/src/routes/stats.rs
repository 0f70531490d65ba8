//! Index status.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::{ApiError, Envelope};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/check-data", get(check_data))
}

/// GET /check-data: whether the index holds any chunks.
async fn check_data(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let stats = state
        .store
        .stats()
        .await
        .map_err(|e| ApiError::new(e, Envelope::CheckData))?;

    let has_data = stats.total_records > 0;
    let message = if has_data {
        "You can start chatting!"
    } else {
        "No documents yet. Upload a document to start chatting."
    };

    Ok(Json(json!({
        "success": true,
        "hasData": has_data,
        "totalChunks": stats.total_records,
        "message": message,
        "error": null,
    })))
}
