//! Router assembly and handlers.
//!
//! SYSTEM CONTEXT
//! ==============
//! The database fires a webhook at `POST /` after each insert into `posts`.
//! The relay formats one Slack message per event and answers synchronously;
//! it keeps no record of events it has already delivered.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::error::RelayError;
use crate::message::{PostEvent, format_message};
use crate::state::RelayState;

pub const DELIVERED_BODY: &str = "Notificación enviada a Slack";

pub fn app(state: RelayState) -> Router {
    Router::new()
        .route("/", post(notify_new_post))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /` — forward a new-post event to Slack.
///
/// The body is taken as raw bytes so a bad payload surfaces as our own
/// `500 {"error"}` instead of axum's extractor rejection.
pub async fn notify_new_post(
    State(state): State<RelayState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), RelayError> {
    let event = PostEvent::from_slice(&body)?;
    let text = format_message(&event.record);
    let posted = state.chat.post_message(&state.channel_id, &text).await?;
    tracing::info!(
        username = %event.record.username,
        channel = %posted.channel,
        ts = %posted.ts,
        "new post announced"
    );
    Ok((StatusCode::OK, DELIVERED_BODY))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
