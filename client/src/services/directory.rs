//! User directory — profile search and single-profile lookup.
//!
//! DESIGN
//! ======
//! Both operations return avatars already resolved to local object URLs.
//! Search resolves all avatars concurrently and joins before returning;
//! `join_all` yields results in input order, so the backend's ordering is
//! preserved no matter which download finishes first.
//!
//! ERROR HANDLING
//! ==============
//! Search failures are logged and yield an empty list. Lookup failures are
//! reported through [`ProfileLookup::Failed`] so callers can tell "no such
//! user" from "could not ask".

#[cfg(test)]
#[path = "directory_test.rs"]
mod directory_test;

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::net::Backend;
use crate::net::types::ProfileRow;
use crate::state::auth::SessionStore;
use crate::state::pictures::PictureResolver;

/// A profile row with its avatar resolved for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: Option<String>,
    pub full_name: Option<String>,
    /// Local object URL; `None` when the user has no avatar, `""` when the
    /// avatar could not be downloaded.
    pub profile_picture: Option<String>,
    pub email: Option<String>,
}

/// Outcome of [`Directory::get_user_profile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileLookup {
    Found(UserProfile),
    NotFound,
    Failed(String),
}

#[derive(Clone)]
pub struct Directory {
    backend: Arc<dyn Backend>,
    pictures: PictureResolver,
}

impl Directory {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, pictures: PictureResolver) -> Self {
        Self { backend, pictures }
    }

    /// Directory sharing the session's backend and object URL registry.
    #[must_use]
    pub fn for_session(session: &SessionStore) -> Self {
        Self::new(session.backend().clone(), session.pictures().clone())
    }

    /// Profiles whose `full_name` or `username` contains `query`, ignoring case.
    pub async fn search_users(&self, query: &str) -> Vec<UserProfile> {
        let rows = match self.backend.search_profiles(query).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, %query, "user search failed");
                return Vec::new();
            }
        };
        tracing::debug!(%query, matches = rows.len(), "user search");

        join_all(rows.into_iter().map(|row| self.with_picture(row))).await
    }

    /// Exact lookup by id.
    pub async fn get_user_profile(&self, id: Uuid) -> ProfileLookup {
        match self.backend.get_profile(id).await {
            Ok(Some(row)) => ProfileLookup::Found(self.with_picture(row).await),
            Ok(None) => ProfileLookup::NotFound,
            Err(e) => {
                tracing::error!(error = %e, user_id = %id, "profile lookup failed");
                ProfileLookup::Failed(e.to_string())
            }
        }
    }

    /// Release the avatar URLs held by `profiles`.
    pub fn release(&self, profiles: &[UserProfile]) {
        for url in profiles.iter().filter_map(|p| p.profile_picture.as_deref()) {
            self.pictures.release(url);
        }
    }

    async fn with_picture(&self, row: ProfileRow) -> UserProfile {
        let profile_picture = match row.profile_picture {
            Some(ref name) if !name.is_empty() => Some(self.pictures.resolve(name).await),
            other => other,
        };
        UserProfile { id: row.id, username: row.username, full_name: row.full_name, profile_picture, email: row.email }
    }
}
