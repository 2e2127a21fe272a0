//! Remote backend access.
//!
//! SYSTEM CONTEXT
//! ==============
//! `Backend` is the seam between app logic and the hosted auth/table/storage
//! service. `supabase` is the production implementation over HTTPS, `config`
//! parses its environment, and `types` defines the shared wire schema.

pub mod config;
#[cfg(test)]
pub mod fake;
pub mod supabase;
pub mod types;

use uuid::Uuid;

use types::{AuthSession, FileUpload, NewProfile, ProfileRow, ProfileUpdate, SignUpResponse};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// A required configuration variable is not set.
    #[error("missing config: env var {var} not set")]
    MissingConfig { var: String },

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("api error: status {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The operation needs a signed-in user and there is none.
    #[error("no active session")]
    NoSession,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl BackendError {
    /// `true` when the service rejected the call because of a uniqueness or
    /// other constraint violation (PostgREST answers 409).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { status: 409, .. })
    }
}

// =============================================================================
// BACKEND TRAIT
// =============================================================================

/// Auth, `profiles` table and avatar storage operations.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Return the locally held session, if any.
    async fn get_session(&self) -> Result<Option<AuthSession>, BackendError>;

    /// Sign in with email and password, replacing any held session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;

    /// Create a new auth identity.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, BackendError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Send a password-recovery email.
    async fn reset_password_for_email(&self, email: &str) -> Result<(), BackendError>;

    /// Fetch a single profile row by id. `Ok(None)` when no row matches.
    async fn get_profile(&self, id: Uuid) -> Result<Option<ProfileRow>, BackendError>;

    /// Case-insensitive substring search over `full_name` and `username`.
    async fn search_profiles(&self, query: &str) -> Result<Vec<ProfileRow>, BackendError>;

    /// Insert a new profile row.
    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), BackendError>;

    /// Update columns of an existing profile row.
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<(), BackendError>;

    /// Upload a file into the avatar bucket under `name`.
    async fn upload_file(&self, name: &str, file: &FileUpload) -> Result<(), BackendError>;

    /// Download a file from the avatar bucket.
    async fn download_file(&self, name: &str) -> Result<Vec<u8>, BackendError>;
}
