//! Relay error taxonomy and its HTTP mapping.
//!
//! ERROR HANDLING
//! ==============
//! Every failure the relay can hit surfaces to the database webhook as
//! `500 {"error": "..."}`. The webhook does not retry, so the event is lost;
//! the log line is the only record.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("slack delivery failed: {0}")]
    Delivery(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(String),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "notification not delivered");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
