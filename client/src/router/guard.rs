//! Navigation guard run before every route change.
//!
//! DESIGN
//! ======
//! The decision itself is a pure function of the user's auth phase and the
//! target route (`decide`). `before_each` adds the side effect: if no
//! identity is resident it first tries to load one from the backend.
//!
//! ERROR HANDLING
//! ==============
//! Fail-closed: if anything in the guard panics, navigation is redirected to
//! `/login` instead of being allowed.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::Route;
use crate::state::auth::{Identity, SessionStore};

/// Where the current user stands with respect to route access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    AuthenticatedIncomplete,
    AuthenticatedComplete,
}

impl AuthPhase {
    #[must_use]
    pub fn of(identity: Option<&Identity>) -> Self {
        match identity {
            None => Self::Unauthenticated,
            Some(i) if i.is_profile_complete() => Self::AuthenticatedComplete,
            Some(_) => Self::AuthenticatedIncomplete,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

/// Pure routing rule for `phase` navigating to `target`.
#[must_use]
pub fn decide(phase: AuthPhase, target: &Route) -> GuardDecision {
    match phase {
        AuthPhase::Unauthenticated if target.is_public() => GuardDecision::Allow,
        AuthPhase::Unauthenticated => GuardDecision::Redirect(Route::Login),
        _ if target.is_public() => GuardDecision::Redirect(Route::Home),
        AuthPhase::AuthenticatedIncomplete if *target != Route::CompleteProfile => {
            GuardDecision::Redirect(Route::CompleteProfile)
        }
        AuthPhase::AuthenticatedComplete if *target == Route::CompleteProfile => GuardDecision::Redirect(Route::Home),
        _ => GuardDecision::Allow,
    }
}

/// Ensure a session is loaded, then decide whether `target` is reachable.
pub async fn before_each(session: &SessionStore, target: &Route) -> GuardDecision {
    let outcome = AssertUnwindSafe(async {
        if session.current_identity().await.is_none() {
            session.load_initial_session().await;
        }
        let phase = AuthPhase::of(session.current_identity().await.as_ref());
        (phase, decide(phase, target))
    })
    .catch_unwind()
    .await;

    match outcome {
        Ok((phase, decision)) => {
            if let GuardDecision::Redirect(to) = &decision {
                tracing::debug!(?phase, from = %target, %to, "navigation redirected");
            }
            decision
        }
        Err(_) => {
            tracing::error!(%target, "navigation guard failed; redirecting to login");
            GuardDecision::Redirect(Route::Login)
        }
    }
}
