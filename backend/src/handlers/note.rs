//! Note handlers

use axum::{extract::State, http::StatusCode, Json};
use shared::{
    CollectStatus, CreateNoteInput, DataResponse, NoteFilter, PaginatedResponse, Pagination,
    StatusResponse, UpdateNoteInput, STATUS_SUCCESS,
};
use validator::Validate;

use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::CurrentUser;
use crate::models::Note;
use crate::permission::{self, Rule};
use crate::services::NoteService;
use crate::AppState;

/// List notes with their authors
pub async fn list_notes(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<NoteFilter>,
) -> AppResult<Json<PaginatedResponse<Note>>> {
    let pagination = Pagination::from_query(filter.page, filter.per_page);
    let service = NoteService::new(state.db.clone());
    let (rows, total) = service.list_notes(&filter, pagination).await?;

    let notes = rows.into_iter().map(|row| row.into_note(true)).collect();
    Ok(Json(PaginatedResponse::new(notes, pagination, total)))
}

/// Create a note authored by the current user
pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ApiJson(input): ApiJson<CreateNoteInput>,
) -> AppResult<(StatusCode, Json<DataResponse<Note>>)> {
    input.validate()?;

    let service = NoteService::new(state.db.clone());
    let note = service.create_note(current.user_id, input).await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(note.into_note(false)))))
}

/// Get a note with its author
pub async fn get_note(
    State(state): State<AppState>,
    ApiPath(note_id): ApiPath<i64>,
) -> AppResult<Json<DataResponse<Note>>> {
    let service = NoteService::new(state.db.clone());
    let note = service.get_note(note_id).await?;

    Ok(Json(DataResponse::new(note.into_note(true))))
}

/// Update a note; author only
pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ApiPath(note_id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateNoteInput>,
) -> AppResult<Json<DataResponse<Note>>> {
    input.validate()?;

    let service = NoteService::new(state.db.clone());
    let author_id = service.get_author_id(note_id).await?;
    permission::check(Some(&current), &Rule::user(author_id))?;

    let note = service.update_note(note_id, input).await?;
    Ok(Json(DataResponse::new(note.into_note(false))))
}

/// Delete a note; author only
pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ApiPath(note_id): ApiPath<i64>,
) -> AppResult<Json<StatusResponse>> {
    let service = NoteService::new(state.db.clone());
    let author_id = service.get_author_id(note_id).await?;
    permission::check(Some(&current), &Rule::user(author_id))?;

    service.delete_note(note_id).await?;
    Ok(Json(StatusResponse::success()))
}

/// Collect or uncollect a note for the current user
pub async fn toggle_collect_status(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ApiPath(note_id): ApiPath<i64>,
) -> AppResult<Json<CollectStatus>> {
    let service = NoteService::new(state.db.clone());
    let collected = service
        .toggle_collect_status(note_id, current.user_id)
        .await?;

    Ok(Json(CollectStatus {
        status: STATUS_SUCCESS.to_string(),
        collected,
    }))
}
