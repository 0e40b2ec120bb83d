//! User and session handlers

use axum::{extract::State, http::StatusCode, Json};
use shared::{DataResponse, LoginResponse, StatusResponse, STATUS_SUCCESS};
use validator::Validate;

use crate::error::{ApiError, AppResult};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{CurrentUser, MaybeUser};
use crate::models::{CreateUserInput, LoginInput, UpdateUserInput, User};
use crate::permission::{self, Rule};
use crate::services::{AuthService, PaperService, UserService};
use crate::AppState;

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateUserInput>,
) -> AppResult<(StatusCode, Json<DataResponse<User>>)> {
    input.validate()?;

    let service = UserService::new(state.db.clone(), &state.config);
    let user = service.create_user(input).await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

/// Get a user profile; the email is only shown to the user themselves
pub async fn get_user(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    ApiPath(user_id): ApiPath<i64>,
) -> AppResult<Json<DataResponse<User>>> {
    let service = UserService::new(state.db.clone(), &state.config);
    let user = service.get_user(user_id).await?;

    let user = if permission::is_permitted(viewer.as_ref(), &Rule::user(user_id)) {
        user
    } else {
        user.public()
    };

    Ok(Json(DataResponse::new(user)))
}

/// Get the logged-in user
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
) -> AppResult<Json<DataResponse<User>>> {
    let service = UserService::new(state.db.clone(), &state.config);
    let user = service.get_user(current.user_id).await?;

    Ok(Json(DataResponse::new(user)))
}

/// Update a user's own account
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateUserInput>,
) -> AppResult<Json<DataResponse<User>>> {
    permission::check(Some(&current), &Rule::user(user_id))?;
    input.validate()?;
    if input.is_empty() {
        return Err(ApiError::logic("Nothing to update"));
    }

    let service = UserService::new(state.db.clone(), &state.config);
    let user = service
        .update_user(user_id, input, Some(current.session_id))
        .await?;

    Ok(Json(DataResponse::new(user)))
}

/// Delete a user's own account
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ApiPath(user_id): ApiPath<i64>,
) -> AppResult<Json<StatusResponse>> {
    permission::check(Some(&current), &Rule::user(user_id))?;

    let service = UserService::new(state.db.clone(), &state.config);
    let deleted = service.delete_user(user_id).await?;

    PaperService::new(state.db.clone(), state.store.clone())
        .release_files(&deleted.paper_digests)
        .await;

    Ok(Json(StatusResponse::success()))
}

/// Log in and open a session
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    input.validate()?;

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let (issued, user) = auth_service.login(&input.username, &input.password).await?;

    Ok(Json(LoginResponse {
        status: STATUS_SUCCESS.to_string(),
        token: issued.token,
        expires_at: issued.expires_at,
        data: user.into(),
    }))
}

/// Close the session named by the request token
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
) -> AppResult<Json<StatusResponse>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    auth_service.logout(current.session_id).await?;

    tracing::info!(user_id = current.user_id, session_id = %current.session_id, "User logged out");
    Ok(Json(StatusResponse::success()))
}
