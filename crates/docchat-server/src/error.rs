//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use docchat_core::{Error, ErrorKind};

/// Response body shape. Each endpoint keeps its own failure envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{success, data: null, error}` for `/upload` and `/chat`.
    Data,
    /// `{success, error}` for `/delete`.
    Message,
    /// `{success, hasData: false, error}` for `/check-data`.
    CheckData,
}

#[derive(Debug)]
pub struct ApiError {
    pub error: Error,
    pub envelope: Envelope,
}

impl ApiError {
    pub fn new(error: Error, envelope: Envelope) -> Self {
        Self { error, envelope }
    }

    pub fn status(&self) -> StatusCode {
        status_for(&self.error)
    }
}

pub fn status_for(error: &Error) -> StatusCode {
    match error.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Upstream | ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.error.kind() {
            ErrorKind::Upstream | ErrorKind::Configuration => {
                error!(error = %self.error, %status, "request failed")
            }
            ErrorKind::Validation | ErrorKind::NotFound => {
                warn!(error = %self.error, %status, "request rejected")
            }
        }

        let message = self.error.public_message();
        let body = match self.envelope {
            Envelope::Data => json!({ "success": false, "data": null, "error": message }),
            Envelope::Message => json!({ "success": false, "error": message }),
            Envelope::CheckData => json!({ "success": false, "hasData": false, "error": message }),
        };
        (status, Json(body)).into_response()
    }
}
