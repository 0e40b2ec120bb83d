//! Request middleware

pub mod auth;

pub use auth::{authenticate, AuthUser, CurrentUser, MaybeUser};
