//! Handlers for the `/purchase-orders` resource (PPOs).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use opsboard_core::cache::keys;
use opsboard_core::error::{CoreError, FieldErrors};
use opsboard_core::export::html::render_print_view;
use opsboard_core::export::pdf::render_pdf;
use opsboard_core::purchase_order::{
    created_message, distinct_categories, plan_update, updated_message,
};
use opsboard_core::types::DbId;
use opsboard_db::models::directory::DirectoryKind;
use opsboard_db::models::purchase_order::{
    FanOutWrite, PurchaseOrder, PurchaseOrderDetail, PurchaseOrderFormOptions,
    PurchaseOrderInput, PurchaseOrderUpdate,
};
use opsboard_db::repositories::{CategoryRepo, DirectoryRepo, ProjectRepo, PurchaseOrderRepo};
use serde::Serialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::error::{AppError, AppResult, LookupError};
use crate::export::{html_response, pdf_response, purchase_order_document};
use crate::handlers::{into_result, merge_field_errors, push_field_error};
use crate::response::{DataResponse, FlashResponse, MessageResponse};
use crate::state::AppState;

/// GET /api/v1/purchase-orders
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<PurchaseOrderDetail>>>> {
    let orders = state
        .cache
        .remember(keys::PPOS_LIST, || PurchaseOrderRepo::list_latest(&state.pool))
        .await?;
    Ok(Json(DataResponse { data: orders }))
}

/// GET /api/v1/purchase-orders/create
pub async fn create_form(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<PurchaseOrderFormOptions>>> {
    let options = form_options(&state).await?;
    Ok(Json(DataResponse { data: options }))
}

/// POST /api/v1/purchase-orders
///
/// Creates one row per distinct category in `category_ids`.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<PurchaseOrderInput>,
) -> AppResult<(StatusCode, Json<FlashResponse<Vec<PurchaseOrder>>>)> {
    let categories = validate_input(&state, &input, None).await?;

    let rows = match PurchaseOrderRepo::create_fan_out(&state.pool, &input, &categories).await? {
        FanOutWrite::Written(rows) => rows,
        FanOutWrite::NumberTaken => return Err(po_number_taken()),
    };

    state.cache.invalidate(&[keys::PPOS_LIST]);
    tracing::info!(
        po_number = %input.po_number.trim(),
        project_id = input.project_id,
        rows = rows.len(),
        "Purchase order created"
    );

    Ok((
        StatusCode::CREATED,
        Json(FlashResponse::new(created_message(rows.len()), rows)),
    ))
}

/// GET /api/v1/purchase-orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PurchaseOrderDetail>>> {
    let order = find_detail(&state, id).await?;
    Ok(Json(DataResponse { data: order }))
}

/// A purchase order with its group's categories and the form options.
#[derive(Debug, Serialize)]
pub struct PurchaseOrderEdit {
    pub purchase_order: PurchaseOrderDetail,
    /// Categories of every row sharing the PO number, preselected on edit.
    pub selected_category_ids: Vec<DbId>,
    #[serde(flatten)]
    pub options: PurchaseOrderFormOptions,
}

/// GET /api/v1/purchase-orders/{id}/edit
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PurchaseOrderEdit>>> {
    let purchase_order = find_detail(&state, id).await?;
    let group = PurchaseOrderRepo::list_by_po_number(&state.pool, &purchase_order.po_number).await?;
    let mut selected_category_ids: Vec<DbId> = Vec::with_capacity(group.len());
    for row in &group {
        if !selected_category_ids.contains(&row.category_id) {
            selected_category_ids.push(row.category_id);
        }
    }
    let options = form_options(&state).await?;

    Ok(Json(DataResponse {
        data: PurchaseOrderEdit {
            purchase_order,
            selected_category_ids,
            options,
        },
    }))
}

/// PUT /api/v1/purchase-orders/{id}
///
/// The first category is written onto the edited row; each further category
/// gets a new row. Sibling rows whose category was deselected stay in place
/// and are reported under `stale`.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<PurchaseOrderInput>,
) -> AppResult<Json<FlashResponse<PurchaseOrderUpdate>>> {
    let existing = PurchaseOrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PurchaseOrder",
            id,
        }))?;

    let categories = validate_input(&state, &input, Some(&existing.po_number)).await?;
    let plan = plan_update(&categories)?;

    let outcome = match PurchaseOrderRepo::update_fan_out(&state.pool, id, &input, &plan).await? {
        Some(FanOutWrite::Written(outcome)) => outcome,
        Some(FanOutWrite::NumberTaken) => return Err(po_number_taken()),
        None => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "PurchaseOrder",
                id,
            }))
        }
    };

    state.cache.invalidate(&[keys::PPOS_LIST]);
    tracing::info!(
        purchase_order_id = id,
        po_number = %outcome.updated.po_number,
        created = outcome.created.len(),
        "Purchase order updated"
    );
    if !outcome.stale.is_empty() {
        let stale_ids: Vec<DbId> = outcome.stale.iter().map(|r| r.id).collect();
        tracing::warn!(
            purchase_order_id = id,
            po_number = %existing.po_number,
            stale_ids = ?stale_ids,
            "Deselected categories left their purchase order rows in place"
        );
    }

    Ok(Json(FlashResponse::new(
        updated_message(outcome.created.len()),
        outcome,
    )))
}

/// DELETE /api/v1/purchase-orders/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let existing = PurchaseOrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PurchaseOrder",
            id,
        }))?;

    if !PurchaseOrderRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "PurchaseOrder",
            id,
        }));
    }

    state.cache.invalidate(&[keys::PPOS_LIST]);
    tracing::info!(purchase_order_id = id, po_number = %existing.po_number, "Purchase order deleted");

    Ok(Json(MessageResponse::new(format!(
        "PPO \"{}\" has been deleted successfully",
        existing.po_number
    ))))
}

/// GET /api/v1/purchase-orders/categories/{project_id}
pub async fn categories_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> Result<Json<Value>, LookupError> {
    let categories = CategoryRepo::list_for_project(&state.pool, project_id)
        .await
        .map_err(|e| {
            tracing::error!(project_id, error = %e, "Failed to load project categories");
            LookupError::Internal(
                "An error occurred while fetching categories. Please try again.".into(),
            )
        })?;
    Ok(Json(json!({
        "success": true,
        "categories": categories,
    })))
}

/// GET /api/v1/purchase-orders/export/pdf
pub async fn export_pdf(State(state): State<AppState>) -> AppResult<Response> {
    let orders = PurchaseOrderRepo::list_for_export(&state.pool).await?;
    let now = chrono::Local::now();
    let doc = purchase_order_document(&state.config.brand_name, &orders, &now);
    pdf_response(render_pdf(&doc)?, "PPOs", &now)
}

/// GET /api/v1/purchase-orders/print
pub async fn print(State(state): State<AppState>) -> AppResult<Response> {
    let orders = PurchaseOrderRepo::list_for_export(&state.pool).await?;
    let now = chrono::Local::now();
    let doc = purchase_order_document(&state.config.brand_name, &orders, &now);
    Ok(html_response(render_print_view(&doc)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_detail(state: &AppState, id: DbId) -> AppResult<PurchaseOrderDetail> {
    PurchaseOrderRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PurchaseOrder",
            id,
        }))
}

async fn form_options(state: &AppState) -> Result<PurchaseOrderFormOptions, sqlx::Error> {
    state
        .cache
        .remember(keys::PO_FORM_OPTIONS, || async {
            Ok(PurchaseOrderFormOptions {
                projects: ProjectRepo::list_options(&state.pool).await?,
                categories: CategoryRepo::list(&state.pool).await?,
                suppliers: DirectoryRepo::list(&state.pool, DirectoryKind::Supplier).await?,
            })
        })
        .await
}

/// Check a submission and return its distinct categories in submitted order.
///
/// `own_group` is the PO number of the row being edited; reusing it is not a
/// conflict.
async fn validate_input(
    state: &AppState,
    input: &PurchaseOrderInput,
    own_group: Option<&str>,
) -> AppResult<Vec<DbId>> {
    let mut errors = FieldErrors::new();

    if let Err(e) = input.validate() {
        merge_field_errors(&mut errors, e.into())?;
    }

    let categories = match distinct_categories(&input.category_ids) {
        Ok(categories) => categories,
        Err(e) => {
            merge_field_errors(&mut errors, e)?;
            Vec::new()
        }
    };

    if !ProjectRepo::exists(&state.pool, input.project_id).await? {
        push_field_error(&mut errors, "project_id", "The selected project id is invalid.");
    }
    if !DirectoryRepo::exists(&state.pool, DirectoryKind::Supplier, input.supplier_id).await? {
        push_field_error(&mut errors, "supplier_id", "The selected supplier id is invalid.");
    }
    if !categories.is_empty() && !CategoryRepo::missing_ids(&state.pool, &categories).await?.is_empty() {
        push_field_error(
            &mut errors,
            "category_ids",
            "The selected category ids is invalid.",
        );
    }

    let po_number = input.po_number.trim();
    if !po_number.is_empty()
        && PurchaseOrderRepo::po_number_taken(&state.pool, po_number, own_group).await?
    {
        push_field_error(&mut errors, "po_number", PO_NUMBER_TAKEN);
    }

    into_result(errors)?;
    Ok(categories)
}

const PO_NUMBER_TAKEN: &str = "The po number has already been taken.";

/// A concurrent submission claimed the PO number after validation passed.
fn po_number_taken() -> AppError {
    let mut errors = FieldErrors::new();
    push_field_error(&mut errors, "po_number", PO_NUMBER_TAKEN);
    AppError::Core(CoreError::InvalidFields(errors))
}
