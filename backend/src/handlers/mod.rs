//! HTTP handlers

pub mod health;
pub mod note;
pub mod paper;
pub mod user;

pub use health::*;
pub use note::*;
pub use paper::*;
pub use user::*;
