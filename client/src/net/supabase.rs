//! Supabase REST client: GoTrue auth, PostgREST `profiles`, avatar storage.
//!
//! DESIGN
//! ======
//! Only the handful of endpoints the app uses are wrapped. The auth session is
//! held in memory after sign-in/sign-up and its access token is sent as the
//! bearer on every request so row-level security sees the signed-in user;
//! without a session the anon key is used instead.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx answers become [`BackendError::Api`] carrying the service's own
//! message (`msg`, `message`, `error_description` or `error`, whichever the
//! endpoint uses).

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, Url};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::config::SupabaseConfig;
use super::types::{AuthSession, AuthUser, FileUpload, NewProfile, ProfileRow, ProfileUpdate, SignUpResponse};
use super::{Backend, BackendError};

const PROFILES_PATH: &str = "/rest/v1/profiles";
const PROFILE_COLUMNS: &str = "id,username,full_name,profile_picture,email";

pub struct SupabaseClient {
    http: reqwest::Client,
    config: SupabaseConfig,
    session: RwLock<Option<AuthSession>>,
}

impl SupabaseClient {
    /// Build a client from parsed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: SupabaseConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config, session: RwLock::new(None) })
    }

    /// Build a client from `SUPABASE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or the HTTP client
    /// fails to build.
    pub fn from_env() -> Result<Self, BackendError> {
        Self::new(SupabaseConfig::from_env()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url, path)
    }

    /// Storage object URL, e.g. `/storage/v1/object/authenticated/profiles/<name>`.
    /// The object name is percent-encoded as a single path segment.
    fn storage_url(&self, access: Option<&str>, name: &str) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.config.url).map_err(|e| BackendError::ConfigParse(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| BackendError::ConfigParse(format!("not a base URL: {}", self.config.url)))?;
            segments.pop_if_empty().extend(["storage", "v1", "object"]);
            if let Some(access) = access {
                segments.push(access);
            }
            segments.push(&self.config.profile_bucket).push(name);
        }
        Ok(url)
    }

    async fn bearer(&self) -> String {
        self.session
            .read()
            .await
            .as_ref()
            .map_or_else(|| self.config.anon_key.clone(), |s| s.access_token.clone())
    }

    async fn request(&self, method: Method, url: impl reqwest::IntoUrl) -> RequestBuilder {
        let bearer = self.bearer().await;
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(req: RequestBuilder) -> Result<Response, BackendError> {
        let resp = req
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, message: error_message(&body) });
        }
        Ok(resp)
    }

    async fn send_text(req: RequestBuilder) -> Result<String, BackendError> {
        Self::send(req)
            .await?
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))
    }

    async fn store_session(&self, session: Option<AuthSession>) {
        *self.session.write().await = session;
    }
}

#[async_trait::async_trait]
impl Backend for SupabaseClient {
    async fn get_session(&self) -> Result<Option<AuthSession>, BackendError> {
        let Some(mut session) = self.session.read().await.clone() else {
            return Ok(None);
        };

        // Revalidate the held token; a rejected one means the session is gone.
        let req = self.request(Method::GET, self.endpoint("/auth/v1/user")).await;
        match Self::send_text(req).await {
            Ok(body) => {
                session.user = serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))?;
                self.store_session(Some(session.clone())).await;
                Ok(Some(session))
            }
            Err(BackendError::Api { status: 401 | 403, .. }) => {
                tracing::debug!("held session rejected; clearing");
                self.store_session(None).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let req = self
            .request(Method::POST, self.endpoint("/auth/v1/token?grant_type=password"))
            .await
            .json(&json!({ "email": email, "password": password }));
        let body = Self::send_text(req).await?;
        let session: AuthSession = serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))?;
        self.store_session(Some(session.clone())).await;
        tracing::debug!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, BackendError> {
        let req = self
            .request(Method::POST, self.endpoint("/auth/v1/signup"))
            .await
            .json(&json!({ "email": email, "password": password }));
        let body = Self::send_text(req).await?;
        let resp = parse_sign_up(&body)?;
        if resp.session.is_some() {
            self.store_session(resp.session.clone()).await;
        }
        Ok(resp)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.session.read().await.is_none() {
            return Ok(());
        }
        let req = self
            .request(Method::POST, self.endpoint("/auth/v1/logout"))
            .await;
        match Self::send(req).await {
            // Already revoked server-side: the local session is stale either way.
            Ok(_) | Err(BackendError::Api { status: 401 | 403 | 404, .. }) => {
                self.store_session(None).await;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<(), BackendError> {
        let req = self
            .request(Method::POST, self.endpoint("/auth/v1/recover"))
            .await
            .json(&json!({ "email": email }));
        Self::send(req).await?;
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<ProfileRow>, BackendError> {
        let req = self
            .request(Method::GET, self.endpoint(PROFILES_PATH))
            .await
            .query(&[("select", PROFILE_COLUMNS.to_owned()), ("id", format!("eq.{id}"))]);
        let body = Self::send_text(req).await?;
        first_row(&body)
    }

    async fn search_profiles(&self, query: &str) -> Result<Vec<ProfileRow>, BackendError> {
        let req = self
            .request(Method::GET, self.endpoint(PROFILES_PATH))
            .await
            .query(&[("select", PROFILE_COLUMNS.to_owned()), ("or", search_filter(query))]);
        let body = Self::send_text(req).await?;
        serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), BackendError> {
        let req = self
            .request(Method::POST, self.endpoint(PROFILES_PATH))
            .await
            .header("Prefer", "return=minimal")
            .json(profile);
        Self::send(req).await?;
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<(), BackendError> {
        let req = self
            .request(Method::PATCH, self.endpoint(PROFILES_PATH))
            .await
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(update);
        Self::send(req).await?;
        Ok(())
    }

    async fn upload_file(&self, name: &str, file: &FileUpload) -> Result<(), BackendError> {
        let url = self.storage_url(None, name)?;
        let req = self
            .request(Method::POST, url)
            .await
            .header("Content-Type", &file.content_type)
            .header("x-upsert", "false")
            .body(file.bytes.clone());
        Self::send(req).await?;
        Ok(())
    }

    async fn download_file(&self, name: &str) -> Result<Vec<u8>, BackendError> {
        let url = self.storage_url(Some("authenticated"), name)?;
        let req = self.request(Method::GET, url).await;
        let bytes = Self::send(req)
            .await?
            .bytes()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// WIRE HELPERS
// =============================================================================

/// Extract a human-readable message from an error response body.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_owned();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() { "empty response body".to_owned() } else { trimmed.to_owned() }
}

/// Parse a sign-up response, which is either a session (confirmation
/// disabled) or a bare user object (confirmation pending).
pub(crate) fn parse_sign_up(body: &str) -> Result<SignUpResponse, BackendError> {
    let value: Value = serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))?;

    if value.get("access_token").is_some() {
        let session: AuthSession = serde_json::from_value(value).map_err(|e| BackendError::Parse(e.to_string()))?;
        return Ok(SignUpResponse { user: Some(session.user.clone()), session: Some(session) });
    }

    let user_value = match value.get("user") {
        Some(user) if !user.is_null() => user.clone(),
        _ => value,
    };
    if user_value.get("id").is_none() {
        return Ok(SignUpResponse::default());
    }
    let user: AuthUser = serde_json::from_value(user_value).map_err(|e| BackendError::Parse(e.to_string()))?;
    Ok(SignUpResponse { user: Some(user), session: None })
}

/// Build the PostgREST `or=` filter for a directory search.
///
/// Characters with meaning in the filter grammar are dropped from the user's
/// input so it can only ever produce the two `ilike` terms.
pub(crate) fn search_filter(query: &str) -> String {
    let term: String = query
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '%' | '"' | '\\'))
        .collect();
    let term = term.trim();
    format!("(full_name.ilike.*{term}*,username.ilike.*{term}*)")
}

/// First row of a PostgREST array response.
pub(crate) fn first_row(body: &str) -> Result<Option<ProfileRow>, BackendError> {
    let rows: Vec<ProfileRow> = serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))?;
    Ok(rows.into_iter().next())
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
