//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by the navigation guard and identity-aware views to decide where a
//! user may go and what to render. One `SessionStore` lives for the whole app
//! and is shared by `Arc`; it is only written from the sequential
//! guard/user-action flow.
//!
//! ERROR HANDLING
//! ==============
//! `load_initial_session` never fails: any problem is logged and the store is
//! reset, which sends the user down the unauthenticated path. Explicit user
//! actions (`sign_in`, `logout`, `complete_profile`) return their errors.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::pictures::{ObjectUrls, PictureResolver};
use crate::net::types::ProfileUpdate;
use crate::net::{Backend, BackendError};

pub const UNKNOWN_EMAIL: &str = "email-desconocido@example.com";
pub const UNKNOWN_FULL_NAME: &str = "Nombre desconocido";
pub const NO_PICTURE: &str = "sin foto";

/// Core attributes of the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    /// Empty until the user completes their profile.
    pub username: String,
    pub full_name: String,
    /// Storage object name of the avatar, or [`NO_PICTURE`].
    pub profile_picture: String,
}

impl Identity {
    /// Both `username` and `full_name` are set.
    #[must_use]
    pub fn is_profile_complete(&self) -> bool {
        !self.username.is_empty() && !self.full_name.is_empty()
    }
}

/// UI-facing subset of the identity. Empty strings when signed out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DisplayProfile {
    pub first_name: String,
    /// Local object URL of the avatar, or empty when there is none.
    pub profile_picture: String,
}

impl DisplayProfile {
    fn is_populated(&self) -> bool {
        !self.first_name.is_empty() && !self.profile_picture.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session load failed: {0}")]
    Load(#[source] BackendError),
    #[error("profile fetch failed for {id}: {source}")]
    ProfileFetch {
        id: Uuid,
        #[source]
        source: BackendError,
    },
    #[error("no profile row for {0}")]
    ProfileMissing(Uuid),
    #[error("not signed in")]
    NotAuthenticated,
    #[error("sign-in failed: {0}")]
    SignIn(#[source] BackendError),
    #[error("sign-out failed: {0}")]
    SignOut(#[source] BackendError),
    #[error("profile update failed: {0}")]
    ProfileUpdate(#[source] BackendError),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

/// First word of a full name (everything before the first space).
#[must_use]
pub fn first_name_of(full_name: &str) -> &str {
    full_name.split(' ').next().unwrap_or_default()
}

#[derive(Default)]
struct SessionInner {
    identity: Option<Identity>,
    display: DisplayProfile,
}

/// Process-wide session context: current identity plus display profile.
pub struct SessionStore {
    backend: Arc<dyn Backend>,
    pictures: PictureResolver,
    inner: RwLock<SessionInner>,
}

impl SessionStore {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let pictures = PictureResolver::new(backend.clone(), ObjectUrls::new());
        Self::with_pictures(backend, pictures)
    }

    /// Share an existing picture resolver (and its URL registry).
    #[must_use]
    pub fn with_pictures(backend: Arc<dyn Backend>, pictures: PictureResolver) -> Self {
        Self { backend, pictures, inner: RwLock::new(SessionInner::default()) }
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    #[must_use]
    pub fn pictures(&self) -> &PictureResolver {
        &self.pictures
    }

    pub async fn current_identity(&self) -> Option<Identity> {
        self.inner.read().await.identity.clone()
    }

    pub async fn display_profile(&self) -> DisplayProfile {
        self.inner.read().await.display.clone()
    }

    /// Populate the store from the backend's active session.
    ///
    /// A resident identity with a fully populated display profile is reused
    /// without any backend call.
    pub async fn load_initial_session(&self) {
        {
            let inner = self.inner.read().await;
            if inner.identity.is_some() && inner.display.is_populated() {
                tracing::debug!("session already resident; skipping fetch");
                return;
            }
        }

        if let Err(e) = self.fetch_session().await {
            match e {
                SessionError::NotAuthenticated => tracing::debug!("no active session"),
                e => tracing::warn!(error = %e, "initial session load failed"),
            }
            self.reset_session().await;
        }
    }

    async fn fetch_session(&self) -> Result<Identity, SessionError> {
        let session = self
            .backend
            .get_session()
            .await
            .map_err(SessionError::Load)?
            .ok_or(SessionError::NotAuthenticated)?;
        let id = session.user.id;

        let row = self
            .backend
            .get_profile(id)
            .await
            .map_err(|source| SessionError::ProfileFetch { id, source })?
            .ok_or(SessionError::ProfileMissing(id))?;

        // A null full_name gets the placeholder, which counts as set for
        // profile completeness; only a missing username forces completion.
        let full_name = row.full_name.unwrap_or_else(|| UNKNOWN_FULL_NAME.to_owned());
        let first_name = first_name_of(&full_name).to_owned();
        let picture_ref = row.profile_picture.filter(|p| !p.is_empty());
        let identity = Identity {
            id,
            email: session.user.email.unwrap_or_else(|| UNKNOWN_EMAIL.to_owned()),
            username: row.username.unwrap_or_default(),
            full_name,
            profile_picture: picture_ref.clone().unwrap_or_else(|| NO_PICTURE.to_owned()),
        };

        let picture_url = match &picture_ref {
            Some(name) => self.pictures.resolve(name).await,
            None => String::new(),
        };

        let mut inner = self.inner.write().await;
        let previous = std::mem::take(&mut inner.display.profile_picture);
        self.pictures.release(&previous);
        inner.identity = Some(identity.clone());
        inner.display = DisplayProfile { first_name, profile_picture: picture_url };
        tracing::info!(user_id = %id, complete = identity.is_profile_complete(), "session loaded");
        Ok(identity)
    }

    /// Clear identity and display profile, releasing the held avatar URL.
    pub async fn reset_session(&self) {
        let mut inner = self.inner.write().await;
        let previous = std::mem::take(&mut inner.display.profile_picture);
        self.pictures.release(&previous);
        inner.identity = None;
        inner.display = DisplayProfile::default();
    }

    /// Password sign-in followed by a fresh session load.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SignIn`] if the credentials are rejected, or
    /// the load error if the profile cannot be read (the store is reset).
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, SessionError> {
        self.backend
            .sign_in_with_password(email.trim(), password)
            .await
            .map_err(SessionError::SignIn)?;

        match self.fetch_session().await {
            Ok(identity) => Ok(identity),
            Err(e) => {
                tracing::warn!(error = %e, "session load after sign-in failed");
                self.reset_session().await;
                Err(e)
            }
        }
    }

    /// Sign out remotely, then clear local state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SignOut`] if the backend call fails; local
    /// state is left untouched in that case.
    pub async fn logout(&self) -> Result<(), SessionError> {
        match self.backend.sign_out().await {
            Ok(()) => {
                self.reset_session().await;
                tracing::info!("signed out");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "sign-out failed");
                Err(SessionError::SignOut(e))
            }
        }
    }

    /// Set `username` and `full_name` for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidInput`] for blank values,
    /// [`SessionError::NotAuthenticated`] without a resident identity, or
    /// [`SessionError::ProfileUpdate`] if the backend rejects the write.
    pub async fn complete_profile(&self, username: &str, full_name: &str) -> Result<Identity, SessionError> {
        let username = username.trim();
        let full_name = full_name.trim();
        if username.is_empty() {
            return Err(SessionError::InvalidInput("username is required"));
        }
        if full_name.is_empty() {
            return Err(SessionError::InvalidInput("full name is required"));
        }

        let id = self
            .current_identity()
            .await
            .map(|i| i.id)
            .ok_or(SessionError::NotAuthenticated)?;

        let update = ProfileUpdate { username: Some(username.to_owned()), full_name: Some(full_name.to_owned()) };
        self.backend
            .update_profile(id, &update)
            .await
            .map_err(SessionError::ProfileUpdate)?;

        let mut inner = self.inner.write().await;
        let SessionInner { identity, display } = &mut *inner;
        let identity = identity
            .as_mut()
            .filter(|i| i.id == id)
            .ok_or(SessionError::NotAuthenticated)?;
        identity.username = username.to_owned();
        identity.full_name = full_name.to_owned();
        display.first_name = first_name_of(full_name).to_owned();
        tracing::info!(user_id = %id, "profile completed");
        Ok(identity.clone())
    }
}
