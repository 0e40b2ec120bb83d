//! Business logic services for the Academia backend

pub mod auth;
pub mod note;
pub mod paper;
pub mod user;

pub use auth::AuthService;
pub use note::NoteService;
pub use paper::PaperService;
pub use user::UserService;
