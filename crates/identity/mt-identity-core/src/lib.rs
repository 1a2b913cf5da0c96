//! Core types for movie-tracker authentication.
//!
//! This crate defines the user model shared by every authentication path,
//! the [`UserStore`] trait that abstracts user persistence, and the
//! [`AuthError`] taxonomy surfaced to callers at the API boundary.

mod error;
mod store;
mod user;

pub use error::{AuthError, AuthResult};
pub use store::{InMemoryUserStore, UserStore};
pub use user::{User, UserSummary};
