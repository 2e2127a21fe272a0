//! Webhook payload and Slack message formatting.

use serde::Deserialize;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::RelayError;

const RENDERED_DATE: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");

/// Postgres `timestamp` without offset, as emitted for `created_at`.
const NAIVE_TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");

/// Database webhook body: the inserted `posts` row under `record`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostEvent {
    pub record: PostRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostRecord {
    pub username: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: String,
}

impl PostEvent {
    /// Decode a raw webhook body.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if the body is not JSON or lacks `record`
    /// or one of its required fields. A record without `username` or
    /// `created_at` is rejected with a 500 instead of being announced with
    /// placeholder values, so the webhook log shows the bad row.
    pub fn from_slice(body: &[u8]) -> Result<Self, RelayError> {
        serde_json::from_slice(body).map_err(|e| RelayError::MalformedPayload(e.to_string()))
    }
}

/// Render the Slack text for a new post.
#[must_use]
pub fn format_message(record: &PostRecord) -> String {
    format!(
        "📢 *Nuevo post creado*\n- *Usuario:* {}\n- *Descripción:* {}\n- *Fecha:* {}",
        record.username,
        record.description.as_deref().unwrap_or_default(),
        format_timestamp(&record.created_at),
    )
}

/// Render `raw` as a UTC date-time. Accepts RFC 3339 and offset-less
/// timestamps (treated as UTC); anything else is returned verbatim.
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    let parsed = OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339)
        .ok()
        .or_else(|| PrimitiveDateTime::parse(raw, NAIVE_TIMESTAMP).ok().map(PrimitiveDateTime::assume_utc));

    parsed
        .and_then(|dt| dt.to_offset(time::UtcOffset::UTC).format(RENDERED_DATE).ok())
        .unwrap_or_else(|| {
            tracing::debug!(%raw, "unparsable created_at; rendering verbatim");
            raw.to_owned()
        })
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
