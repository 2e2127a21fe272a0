//! Wire DTOs for the auth, table and storage APIs.
//!
//! DESIGN
//! ======
//! Column names mirror the `profiles` table exactly so rows deserialize
//! without renames. Every text column is nullable on the wire; callers decide
//! what an absent value means.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The auth user embedded in a session or returned by sign-up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Auth identity id; equals the `profiles.id` of the same user.
    pub id: Uuid,
    /// Email the identity was created with, if the provider returned one.
    #[serde(default)]
    pub email: Option<String>,
}

/// An active auth session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

/// Result of a sign-up call.
///
/// With email confirmation enabled the provider returns only the user and no
/// session; with it disabled both are present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignUpResponse {
    pub user: Option<AuthUser>,
    pub session: Option<AuthSession>,
}

/// A row of the remote `profiles` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: Uuid,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    /// Storage object name of the avatar, not a URL.
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Insert payload for a new `profiles` row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub profile_picture: Option<String>,
    pub email: String,
}

/// Partial update of a `profiles` row. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// A file picked by the user for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileUpload {
    /// Original file name as chosen by the user.
    pub name: String,
    /// MIME type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}
