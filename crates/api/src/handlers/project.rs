//! Handlers for the `/projects` resource.
//!
//! Project changes feed every dropdown and joined listing, so each write
//! drops all listing keys that embed project data.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use opsboard_core::cache::keys;
use opsboard_core::error::{CoreError, FieldErrors};
use opsboard_core::types::DbId;
use opsboard_db::models::project::{CreateProject, Project, ProjectOption, UpdateProject};
use opsboard_db::repositories::ProjectRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::{into_result, merge_field_errors, push_field_error};
use crate::response::{DataResponse, FlashResponse, MessageResponse};
use crate::state::AppState;

/// Listings that embed project fields.
const PROJECT_DEPENDENT_KEYS: &[&str] = &[
    keys::PROJECTS_LIST,
    keys::INVOICES_LIST,
    keys::PPOS_LIST,
    keys::PO_FORM_OPTIONS,
    keys::REPORT_FILTER_OPTIONS,
];

/// GET /api/v1/projects
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/options
pub async fn options(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ProjectOption>>>> {
    let options = state
        .cache
        .remember(keys::PROJECTS_LIST, || ProjectRepo::list_options(&state.pool))
        .await?;
    Ok(Json(DataResponse { data: options }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<FlashResponse<Project>>)> {
    let mut errors = FieldErrors::new();
    if let Err(e) = input.validate() {
        merge_field_errors(&mut errors, e.into())?;
    }
    if !input.pr_number.trim().is_empty()
        && ProjectRepo::pr_number_taken(&state.pool, &input.pr_number, None).await?
    {
        push_field_error(&mut errors, "pr_number", "The pr number has already been taken.");
    }
    into_result(errors)?;

    let project = ProjectRepo::create(&state.pool, &input).await?;

    state.cache.invalidate(PROJECT_DEPENDENT_KEYS);
    tracing::info!(project_id = project.id, pr_number = %project.pr_number, "Project created");

    Ok((
        StatusCode::CREATED,
        Json(FlashResponse::new("Project created successfully", project)),
    ))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<FlashResponse<Project>>> {
    let mut errors = FieldErrors::new();
    if let Err(e) = input.validate() {
        merge_field_errors(&mut errors, e.into())?;
    }
    if let Some(pr_number) = input.pr_number.as_deref().filter(|p| !p.trim().is_empty()) {
        if ProjectRepo::pr_number_taken(&state.pool, pr_number, Some(id)).await? {
            push_field_error(&mut errors, "pr_number", "The pr number has already been taken.");
        }
    }
    into_result(errors)?;

    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    state.cache.invalidate(PROJECT_DEPENDENT_KEYS);
    tracing::info!(project_id = id, "Project updated");

    Ok(Json(FlashResponse::new("Project updated successfully", project)))
}

/// DELETE /api/v1/projects/{id}
///
/// Refused with 409 while invoices or purchase orders reference the project.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    if !ProjectRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }));
    }

    state.cache.invalidate(PROJECT_DEPENDENT_KEYS);
    tracing::info!(project_id = id, "Project deleted");

    Ok(Json(MessageResponse::new("Project deleted successfully")))
}
