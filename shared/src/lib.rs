//! Shared types and models for the Academia backend
//!
//! Wire models, request inputs and validation rules used by the server and
//! by anything that talks to it.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
