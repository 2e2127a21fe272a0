//! Client state containers.
//!
//! SYSTEM CONTEXT
//! ==============
//! `auth` holds the signed-in identity shared by the router and views;
//! `pictures` owns the local object URLs that avatars are rendered from.

pub mod auth;
pub mod pictures;
