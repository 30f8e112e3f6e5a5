//! Core types for the SecureBank client.
//!
//! This module provides type-safe wrappers for the identity a session carries.

pub mod email;
pub mod id;
pub mod identity;
pub mod role;
pub mod session;

pub use email::{Email, EmailError};
pub use id::UserId;
pub use identity::Identity;
pub use role::{RoleError, UserRole};
pub use session::SessionState;
