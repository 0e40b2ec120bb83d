//! Domain models for the Academia backend

mod note;
mod paper;
mod user;

pub use note::*;
pub use paper::*;
pub use user::*;
