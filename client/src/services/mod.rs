//! Account and directory operations used by views.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the multi-step backend workflows so views and the CLI
//! only translate input and render results.

pub mod directory;
pub mod registration;
