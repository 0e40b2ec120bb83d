//! Route definitions for the Academia backend
//!
//! Every resource follows the same shape: the collection at `/<resource>`,
//! instances at `/<resource>/:id`, named collection actions at
//! `/<resource>/<action>` and instance actions at `/<resource>/:id/<action>`.

use axum::{
    routing::{get, post},
    Router,
};

use crate::error::ApiError;
use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Liveness (public)
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health_check))
        .nest("/users", user_routes())
        .nest("/notes", note_routes())
        .nest("/papers", paper_routes())
        .fallback(route_not_found)
}

/// User and session routes
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_user))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::get_me))
        .route(
            "/:user_id",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
}

/// Note routes
fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notes).post(handlers::create_note))
        .route(
            "/:note_id",
            get(handlers::get_note)
                .patch(handlers::update_note)
                .delete(handlers::delete_note),
        )
        .route(
            "/:note_id/toggle_collect_status",
            post(handlers::toggle_collect_status),
        )
}

/// Paper routes
fn paper_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_papers).post(handlers::create_paper))
        .route(
            "/:paper_id",
            get(handlers::get_paper)
                .patch(handlers::update_paper)
                .delete(handlers::delete_paper),
        )
        .route("/:paper_id/file", get(handlers::get_paper_file))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("route")
}
