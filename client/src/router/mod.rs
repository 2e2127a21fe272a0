//! Client routes and guarded navigation.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every navigation goes through [`guard::before_each`]. A redirect is itself
//! a navigation and is guarded again, so e.g. an incomplete profile visiting
//! `/login` lands on `/complete-profile` via `/`.

pub mod guard;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use std::fmt;
use std::sync::Arc;

use guard::GuardDecision;

use crate::state::auth::SessionStore;

/// Upper bound on chained guard redirects before failing closed.
pub const MAX_REDIRECTS: usize = 4;

/// Public routes reachable without a session.
pub const PUBLIC_PATHS: [&str; 3] = ["/login", "/register", "/forgot-password"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    ForgotPassword,
    UpdatePassword,
    CompleteProfile,
    Home,
    /// `/posts/:id`
    Post(String),
    /// `/profile/:userId`
    Profile(String),
    About,
    NotFound(String),
}

impl Route {
    /// Match a path (query string and fragment ignored) against the route table.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        if !path.is_empty() && !path.starts_with('/') {
            return Self::NotFound(path.to_owned());
        }
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').skip(1).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["forgot-password"] => Self::ForgotPassword,
            ["update-password"] => Self::UpdatePassword,
            ["complete-profile"] => Self::CompleteProfile,
            ["about"] => Self::About,
            ["posts", id] if !id.is_empty() => Self::Post((*id).to_owned()),
            ["profile", user_id] if !user_id.is_empty() => Self::Profile((*user_id).to_owned()),
            _ => Self::NotFound(path.to_owned()),
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_owned(),
            Self::Register => "/register".to_owned(),
            Self::ForgotPassword => "/forgot-password".to_owned(),
            Self::UpdatePassword => "/update-password".to_owned(),
            Self::CompleteProfile => "/complete-profile".to_owned(),
            Self::Home => "/".to_owned(),
            Self::Post(id) => format!("/posts/{id}"),
            Self::Profile(user_id) => format!("/profile/{user_id}"),
            Self::About => "/about".to_owned(),
            Self::NotFound(path) => path.clone(),
        }
    }

    /// Reachable without a session (and bounced to `/` with one).
    #[must_use]
    pub fn is_public(&self) -> bool {
        PUBLIC_PATHS.contains(&self.path().as_str())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Guarded navigation over a shared session.
pub struct AppRouter {
    session: Arc<SessionStore>,
    current: Option<Route>,
}

impl AppRouter {
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session, current: None }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Route the user is on, `None` before the first navigation.
    #[must_use]
    pub fn current(&self) -> Option<&Route> {
        self.current.as_ref()
    }

    /// Navigate to `path`, following guard redirects. Returns the route
    /// actually landed on.
    pub async fn push(&mut self, path: &str) -> Route {
        let mut target = Route::parse(path);
        for _ in 0..=MAX_REDIRECTS {
            match guard::before_each(&self.session, &target).await {
                GuardDecision::Allow => {
                    tracing::debug!(route = %target, "navigated");
                    self.current = Some(target.clone());
                    return target;
                }
                GuardDecision::Redirect(next) => target = next,
            }
        }
        tracing::error!(%path, "too many navigation redirects; redirecting to login");
        self.current = Some(Route::Login);
        Route::Login
    }

    /// Sign out and go to `/login`. On failure the error is logged and the
    /// user stays where they are. Returns the route the user ends on.
    pub async fn logout(&mut self) -> Option<Route> {
        match self.session.logout().await {
            Ok(()) => Some(self.push(&Route::Login.path()).await),
            Err(e) => {
                tracing::warn!(error = %e, "logout failed; staying on current route");
                self.current.clone()
            }
        }
    }
}
