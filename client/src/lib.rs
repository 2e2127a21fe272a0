//! Client-side session layer for the Postwall app.
//!
//! SYSTEM CONTEXT
//! ==============
//! Everything the browser app needs beyond rendering: the session store that
//! mirrors the backend auth session, avatar download into local object URLs,
//! directory lookups, registration, and the navigation guard that decides
//! which route a user may land on. All remote work goes through the
//! [`net::Backend`] trait so the same logic runs against Supabase or a fake.

pub mod net;
pub mod router;
pub mod services;
pub mod state;

pub use net::{Backend, BackendError};
pub use router::{AppRouter, Route};
pub use state::auth::{DisplayProfile, Identity, SessionStore};
