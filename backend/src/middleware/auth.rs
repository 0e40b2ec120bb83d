//! Authentication middleware
//!
//! Every request passes through [`authenticate`]. A request without the
//! token header is anonymous; a request whose token does not resolve to a
//! live session is rejected with `auth_failure`, whatever the route.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::AUTH_TOKEN_HEADER;
use crate::error::ApiError;
use crate::services::AuthService;
use crate::AppState;

/// Authenticated session attached to the request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Authentication middleware that resolves the session token, if any
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request.headers().get(AUTH_TOKEN_HEADER) {
        None => return next.run(request).await,
        Some(value) => match value.to_str() {
            Ok(token) => token.trim().to_string(),
            Err(_) => return ApiError::AuthFailure.into_response(),
        },
    };

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    match auth_service.authenticate(&token).await {
        Ok(auth_user) => {
            tracing::Span::current().record("user_id", auth_user.user_id);
            request.extensions_mut().insert(auth_user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extractor for an authenticated user. Rejects anonymous requests with
/// `login_required`.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::LoginRequired)
    }
}

/// Extractor for an optional user; never rejects
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<AuthUser>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}
