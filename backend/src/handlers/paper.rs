//! Paper handlers

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shared::{
    normalize_content_type, sanitize_file_name, DataResponse, PaginatedResponse, Pagination,
    PaperFields, PaperFilter, PaperUpload, StatusResponse,
};
use validator::Validate;

use crate::error::{ApiError, AppResult};
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::CurrentUser;
use crate::models::Paper;
use crate::permission::{self, Rule};
use crate::services::PaperService;
use crate::AppState;

/// Read a paper upload form: text fields plus an optional `file` part
async fn read_paper_form(mut multipart: Multipart) -> AppResult<(PaperFields, Option<PaperUpload>)> {
    let mut fields = PaperFields::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => fields.title = Some(field.text().await?),
            "authors" => fields.authors = Some(field.text().await?),
            "abstract" => fields.abstract_text = Some(field.text().await?),
            "file" => {
                let file_name = sanitize_file_name(field.file_name().unwrap_or_default());
                let content_type = normalize_content_type(field.content_type());
                let bytes = field.bytes().await?.to_vec();
                if bytes.is_empty() {
                    return Err(ApiError::arg("file", "File is empty"));
                }
                upload = Some(PaperUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            other => tracing::debug!("Ignoring unknown form field {:?}", other),
        }
    }

    fields.validate()?;
    Ok((fields, upload))
}

fn service(state: &AppState) -> PaperService {
    PaperService::new(state.db.clone(), state.store.clone())
}

/// List papers
pub async fn list_papers(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PaperFilter>,
) -> AppResult<Json<PaginatedResponse<Paper>>> {
    let pagination = Pagination::from_query(filter.page, filter.per_page);
    let (papers, total) = service(&state).list_papers(&filter, pagination).await?;

    Ok(Json(PaginatedResponse::new(papers, pagination, total)))
}

/// Upload a paper
pub async fn create_paper(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<Paper>>)> {
    let (fields, upload) = read_paper_form(multipart?).await?;
    let paper = service(&state)
        .create_paper(current.user_id, fields, upload)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(paper))))
}

/// Get paper metadata
pub async fn get_paper(
    State(state): State<AppState>,
    ApiPath(paper_id): ApiPath<i64>,
) -> AppResult<Json<DataResponse<Paper>>> {
    let paper = service(&state).get_paper(paper_id).await?;
    Ok(Json(DataResponse::new(paper)))
}

/// Download the paper file
pub async fn get_paper_file(
    State(state): State<AppState>,
    ApiPath(paper_id): ApiPath<i64>,
) -> AppResult<Response> {
    let (paper, bytes) = service(&state).read_paper_file(paper_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, paper.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", paper.file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Update a paper; uploader only
pub async fn update_paper(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ApiPath(paper_id): ApiPath<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<DataResponse<Paper>>> {
    let service = service(&state);
    let existing = service.get_paper(paper_id).await?;
    permission::check(Some(&current), &Rule::user(existing.uploader_id))?;

    let (fields, upload) = read_paper_form(multipart?).await?;
    let paper = service.update_paper(paper_id, fields, upload).await?;

    Ok(Json(DataResponse::new(paper)))
}

/// Delete a paper; uploader only
pub async fn delete_paper(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ApiPath(paper_id): ApiPath<i64>,
) -> AppResult<Json<StatusResponse>> {
    let service = service(&state);
    let existing = service.get_paper(paper_id).await?;
    permission::check(Some(&current), &Rule::user(existing.uploader_id))?;

    service.delete_paper(paper_id).await?;
    Ok(Json(StatusResponse::success()))
}
