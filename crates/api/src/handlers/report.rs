//! Handlers for the `/reports` resource: CRUD, filtered index and CSV export.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use opsboard_core::cache::keys;
use opsboard_core::error::CoreError;
use opsboard_core::export::csv::render_csv;
use opsboard_core::types::DbId;
use opsboard_db::models::report::{Report, ReportFilter, ReportFilterOptions, ReportInput};
use opsboard_db::repositories::ReportRepo;
use serde::Serialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::export::csv_response;
use crate::response::{DataResponse, FlashResponse, MessageResponse};
use crate::state::AppState;

/// Report index payload: the filter dropdowns plus the matching rows.
#[derive(Debug, Serialize)]
pub struct ReportIndex {
    pub filters: ReportFilterOptions,
    pub reports: Vec<Report>,
}

/// GET /api/v1/reports
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<DataResponse<ReportIndex>>> {
    let filters = state
        .cache
        .remember(keys::REPORT_FILTER_OPTIONS, || {
            ReportRepo::filter_options(&state.pool)
        })
        .await?;
    let reports = ReportRepo::list_filtered(&state.pool, &filter).await?;
    Ok(Json(DataResponse {
        data: ReportIndex { filters, reports },
    }))
}

/// POST /api/v1/reports
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ReportInput>,
) -> AppResult<(StatusCode, Json<FlashResponse<Report>>)> {
    input.validate()?;
    let report = ReportRepo::create(&state.pool, &input).await?;
    tracing::info!(report_id = report.id, "Report created");
    Ok((
        StatusCode::CREATED,
        Json(FlashResponse::new("Report created successfully", report)),
    ))
}

/// GET /api/v1/reports/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Report>>> {
    let report = ReportRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Report",
            id,
        }))?;
    Ok(Json(DataResponse { data: report }))
}

/// PUT /api/v1/reports/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReportInput>,
) -> AppResult<Json<FlashResponse<Report>>> {
    input.validate()?;
    let report = ReportRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Report",
            id,
        }))?;
    tracing::info!(report_id = id, "Report updated");
    Ok(Json(FlashResponse::new("Report updated successfully", report)))
}

/// DELETE /api/v1/reports/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    if !ReportRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Report",
            id,
        }));
    }
    tracing::info!(report_id = id, "Report deleted");
    Ok(Json(MessageResponse::new("Report deleted successfully")))
}

/// GET /api/v1/reports/export
///
/// CSV of the reports matching the same filters as the index.
pub async fn export(
    State(state): State<AppState>,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Response> {
    let reports = ReportRepo::list_filtered(&state.pool, &filter).await?;
    let records: Vec<_> = reports.iter().map(Report::csv_record).collect();
    tracing::debug!(rows = records.len(), "Exporting reports");
    csv_response(render_csv(&records), &chrono::Local::now())
}

/// POST /api/v1/reports/cache/clear
pub async fn clear_cache(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.invalidate(&[keys::REPORT_FILTER_OPTIONS]);
    tracing::info!("Report filter cache cleared");
    Json(MessageResponse::new("Reports cache cleared successfully"))
}
