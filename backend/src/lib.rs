//! Academia Backend
//!
//! REST API for sharing academic papers and the notes users write about
//! them.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderName, Method},
    middleware::from_fn_with_state,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod permission;
pub mod routes;
pub mod services;
pub mod storage;

pub use config::Config;
use storage::PaperStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub store: PaperStore,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: Config) -> Self {
        let store = PaperStore::new(&config.storage.data_dir);
        Self {
            db,
            config: Arc::new(config),
            store,
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            HeaderName::from_static("x-academia-auth-token"),
            header::CONTENT_TYPE,
        ])
        .max_age(Duration::from_secs(state.config.cors.max_age));

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            user_id = tracing::field::Empty,
        )
    });

    routes::api_routes()
        .layer(from_fn_with_state(state.clone(), middleware::authenticate))
        .layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(trace)
        .layer(cors)
        .with_state(state)
}
