//! SecureBank Core - Shared session and identity types.
//!
//! This crate provides the types every SecureBank client component agrees on:
//! - `client` - Session manager, credential store, and HTTP client
//! - `cli` - Command-line front end
//! - `integration-tests` - Mock backend and end-to-end scenarios
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage,
//! no HTTP clients. Route guards can evaluate a [`SessionState`] anywhere
//! without pulling in the network stack.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, user IDs, roles, identities and session state
//! - [`access`] - Page access predicates derived from session state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod types;

pub use access::{Access, can_view, can_view_admin, can_view_protected};
pub use types::*;
