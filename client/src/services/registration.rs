//! Account registration and password recovery.
//!
//! DESIGN
//! ======
//! Registration is three dependent remote writes: create the auth identity,
//! upload the optional avatar as `{user_id}-{file_name}`, insert the
//! `profiles` row pointing at it.
//!
//! TRADE-OFFS
//! ==========
//! There is no compensating rollback. If the upload or the profile insert
//! fails, the auth identity (and any uploaded avatar) already exist; the
//! error carries the orphaned user id so the caller can surface or clean it.

#[cfg(test)]
#[path = "registration_test.rs"]
mod registration_test;

use uuid::Uuid;

use crate::net::types::{FileUpload, NewProfile};
use crate::net::{Backend, BackendError};

/// Sign-up form contents.
#[derive(Clone, Debug)]
pub struct Registration {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub profile_picture: Option<FileUpload>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("sign-up rejected: {0}")]
    SignUp(#[source] BackendError),
    #[error("sign-up returned no user id")]
    IdentityCreation,
    #[error("avatar upload failed for {object_name}: {source}")]
    Upload {
        user_id: Uuid,
        object_name: String,
        #[source]
        source: BackendError,
    },
    #[error("profile insert failed for {user_id}: {source}")]
    ProfileInsert {
        user_id: Uuid,
        uploaded: Option<String>,
        #[source]
        source: BackendError,
    },
    #[error("password reset request failed: {0}")]
    PasswordReset(#[source] BackendError),
}

impl RegistrationError {
    /// Auth identity left behind by a partially completed registration.
    #[must_use]
    pub fn orphaned_user(&self) -> Option<Uuid> {
        match self {
            Self::Upload { user_id, .. } | Self::ProfileInsert { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

/// Storage object name for a user's avatar.
#[must_use]
pub fn avatar_object_name(user_id: Uuid, file_name: &str) -> String {
    format!("{user_id}-{file_name}")
}

/// Shape checks only; password strength is the auth service's policy and
/// comes back as a sign-up rejection.
fn validate(registration: &Registration) -> Result<String, RegistrationError> {
    let email = normalize_email(&registration.email).ok_or(RegistrationError::InvalidInput("invalid email"))?;
    if registration.username.trim().is_empty() {
        return Err(RegistrationError::InvalidInput("username is required"));
    }
    if registration.full_name.trim().is_empty() {
        return Err(RegistrationError::InvalidInput("full name is required"));
    }
    if registration.password.is_empty() {
        return Err(RegistrationError::InvalidInput("password is required"));
    }
    if registration
        .profile_picture
        .as_ref()
        .is_some_and(|f| f.name.trim().is_empty())
    {
        return Err(RegistrationError::InvalidInput("profile picture has no file name"));
    }
    Ok(email)
}

/// Create the auth identity, upload the avatar and insert the profile row.
/// Returns the new user's id.
///
/// # Errors
///
/// Returns the [`RegistrationError`] variant for the step that failed. Steps
/// that already succeeded are not undone.
pub async fn register_user(backend: &dyn Backend, registration: &Registration) -> Result<Uuid, RegistrationError> {
    let email = validate(registration)?;

    let created = backend
        .sign_up(&email, &registration.password)
        .await
        .map_err(RegistrationError::SignUp)?;
    let user_id = created
        .user
        .map(|u| u.id)
        .ok_or(RegistrationError::IdentityCreation)?;
    tracing::info!(%user_id, "auth identity created");

    let mut uploaded = None;
    if let Some(file) = &registration.profile_picture {
        let object_name = avatar_object_name(user_id, &file.name);
        if let Err(source) = backend.upload_file(&object_name, file).await {
            tracing::error!(%user_id, error = %source, "avatar upload failed; auth identity left without profile");
            return Err(RegistrationError::Upload { user_id, object_name, source });
        }
        uploaded = Some(object_name);
    }

    let profile = NewProfile {
        id: user_id,
        username: registration.username.trim().to_owned(),
        full_name: registration.full_name.trim().to_owned(),
        profile_picture: uploaded.clone(),
        email,
    };
    if let Err(source) = backend.insert_profile(&profile).await {
        tracing::error!(%user_id, error = %source, "profile insert failed; auth identity left without profile");
        return Err(RegistrationError::ProfileInsert { user_id, uploaded, source });
    }

    tracing::info!(%user_id, username = %profile.username, "user registered");
    Ok(user_id)
}

/// Ask the auth service to email a password-recovery link.
///
/// # Errors
///
/// Returns [`RegistrationError::InvalidInput`] for a malformed email or
/// [`RegistrationError::PasswordReset`] if the request is rejected.
pub async fn request_password_reset(backend: &dyn Backend, email: &str) -> Result<(), RegistrationError> {
    let email = normalize_email(email).ok_or(RegistrationError::InvalidInput("invalid email"))?;
    backend
        .reset_password_for_email(&email)
        .await
        .map_err(RegistrationError::PasswordReset)
}
