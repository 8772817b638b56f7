//! Handlers for the `/invoices` resource.
//!
//! Store and update take `multipart/form-data` so an invoice copy can be
//! uploaded with the form. Every write invalidates the cached invoice list.

use std::collections::HashMap;
use std::str::FromStr;

use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use opsboard_core::cache::keys;
use opsboard_core::error::{CoreError, FieldErrors};
use opsboard_core::export::html::render_print_view;
use opsboard_core::export::pdf::render_pdf;
use opsboard_core::types::DbId;
use opsboard_core::upload::validate_attachment;
use opsboard_db::models::invoice::{Invoice, InvoiceChange, InvoiceInput, InvoiceWithProject};
use opsboard_db::models::project::ProjectOption;
use opsboard_db::repositories::{InvoiceRepo, ProjectRepo};
use rust_decimal::Decimal;
use serde::Serialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::export::{html_response, invoice_document, pdf_response};
use crate::handlers::{into_result, merge_field_errors, push_field_error};
use crate::response::{DataResponse, FlashResponse, MessageResponse};
use crate::state::AppState;

/// Multipart field carrying the invoice copy.
const ATTACHMENT_FIELD: &str = "attachment";

/// GET /api/v1/invoices
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<InvoiceWithProject>>>> {
    let invoices = state
        .cache
        .remember(keys::INVOICES_LIST, || {
            InvoiceRepo::list_with_project(&state.pool)
        })
        .await?;
    Ok(Json(DataResponse { data: invoices }))
}

/// Dropdown data for the invoice form.
#[derive(Debug, Serialize)]
pub struct InvoiceFormOptions {
    pub projects: Vec<ProjectOption>,
}

/// GET /api/v1/invoices/create
pub async fn create_form(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<InvoiceFormOptions>>> {
    let projects = project_options(&state).await?;
    Ok(Json(DataResponse {
        data: InvoiceFormOptions { projects },
    }))
}

/// POST /api/v1/invoices
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<FlashResponse<Invoice>>)> {
    let form = InvoiceForm::read(multipart).await?;
    let input = validate_form(&state, &form, None).await?;

    let stored = store_attachment(&state, &form).await?;
    let change = match InvoiceRepo::create(&state.pool, &input, stored.as_deref()).await {
        Ok(change) => change,
        Err(e) => {
            discard(&state, stored.as_deref()).await;
            return Err(e.into());
        }
    };

    state.cache.invalidate(&[keys::INVOICES_LIST]);
    log_change("Invoice created", &change);

    Ok((
        StatusCode::CREATED,
        Json(FlashResponse::new(
            "Invoice added successfully! ✅",
            change.invoice,
        )),
    ))
}

/// GET /api/v1/invoices/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<InvoiceWithProject>>> {
    let invoice = InvoiceRepo::find_with_project(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Invoice",
            id,
        }))?;
    Ok(Json(DataResponse { data: invoice }))
}

/// An invoice with the options needed to edit it.
#[derive(Debug, Serialize)]
pub struct InvoiceEdit {
    pub invoice: InvoiceWithProject,
    pub projects: Vec<ProjectOption>,
}

/// GET /api/v1/invoices/{id}/edit
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<InvoiceEdit>>> {
    let invoice = InvoiceRepo::find_with_project(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Invoice",
            id,
        }))?;
    let projects = project_options(&state).await?;
    Ok(Json(DataResponse {
        data: InvoiceEdit { invoice, projects },
    }))
}

/// PUT /api/v1/invoices/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<FlashResponse<Invoice>>> {
    if InvoiceRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Invoice",
            id,
        }));
    }

    let form = InvoiceForm::read(multipart).await?;
    let input = validate_form(&state, &form, Some(id)).await?;

    let stored = store_attachment(&state, &form).await?;
    let change = match InvoiceRepo::update(&state.pool, id, &input, stored.as_deref()).await {
        Ok(Some(change)) => change,
        Ok(None) => {
            discard(&state, stored.as_deref()).await;
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Invoice",
                id,
            }));
        }
        Err(e) => {
            discard(&state, stored.as_deref()).await;
            return Err(e.into());
        }
    };

    discard(&state, change.replaced_attachment.as_deref()).await;
    state.cache.invalidate(&[keys::INVOICES_LIST]);
    log_change("Invoice updated", &change);

    Ok(Json(FlashResponse::new(
        "Invoice updated successfully! ✅",
        change.invoice,
    )))
}

/// DELETE /api/v1/invoices/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let removal = InvoiceRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Invoice",
            id,
        }))?;

    discard(&state, removal.invoice.attachment.as_deref()).await;
    state.cache.invalidate(&[keys::INVOICES_LIST]);
    tracing::info!(
        invoice_id = id,
        project_id = removal.invoice.project_id,
        totals = ?removal.totals,
        "Invoice deleted"
    );

    Ok(Json(MessageResponse::new("Invoice deleted successfully! 🗑️")))
}

/// GET /api/v1/invoices/export/pdf
pub async fn export_pdf(State(state): State<AppState>) -> AppResult<Response> {
    let invoices = InvoiceRepo::list_with_project(&state.pool).await?;
    let now = chrono::Local::now();
    let doc = invoice_document(&state.config.brand_name, &invoices, &now);
    pdf_response(render_pdf(&doc)?, "Invoices", &now)
}

/// GET /api/v1/invoices/print
pub async fn print(State(state): State<AppState>) -> AppResult<Response> {
    let invoices = InvoiceRepo::list_with_project(&state.pool).await?;
    let now = chrono::Local::now();
    let doc = invoice_document(&state.config.brand_name, &invoices, &now);
    Ok(html_response(render_print_view(&doc)))
}

// ---------------------------------------------------------------------------
// Form handling
// ---------------------------------------------------------------------------

/// A file part of the submitted form.
struct Upload {
    file_name: String,
    bytes: Bytes,
}

/// The decoded multipart body: text fields plus the optional attachment.
struct InvoiceForm {
    fields: HashMap<String, String>,
    attachment: Option<Upload>,
}

impl InvoiceForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut fields = HashMap::new();
        let mut attachment = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == ATTACHMENT_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() || !bytes.is_empty() {
                    attachment = Some(Upload { file_name, bytes });
                }
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            fields.insert(name, text);
        }

        Ok(Self { fields, attachment })
    }

    /// Trimmed, non-empty text value.
    fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T: FromStr>(
        &self,
        name: &str,
        invalid: &str,
        errors: &mut FieldErrors,
    ) -> Option<T> {
        let label = name.replace('_', " ");
        match self.text(name) {
            None => {
                push_field_error(errors, name, format!("The {label} field is required."));
                None
            }
            Some(raw) => match raw.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    push_field_error(errors, name, format!("The {label} {invalid}"));
                    None
                }
            },
        }
    }
}

/// Check every rule of the invoice form, collecting all field errors.
///
/// `current_id` is the invoice being edited; its own number does not count
/// as taken.
async fn validate_form(
    state: &AppState,
    form: &InvoiceForm,
    current_id: Option<DbId>,
) -> AppResult<InvoiceInput> {
    let mut errors = FieldErrors::new();

    let value: Option<Decimal> = form.parsed("value", "must be a number.", &mut errors);
    let project_id: Option<DbId> =
        form.parsed("project_id", "must be an integer.", &mut errors);

    let input = InvoiceInput {
        invoice_number: form.text("invoice_number").unwrap_or_default().to_string(),
        value: value.unwrap_or_default(),
        project_id: project_id.unwrap_or_default(),
        status: form.text("status").unwrap_or_default().to_string(),
    };
    if let Err(e) = input.validate() {
        for (field, messages) in opsboard_core::validation::field_errors(&e) {
            // Parse failures already explain these fields.
            if !errors.contains_key(&field) {
                errors.insert(field, messages);
            }
        }
    }

    if let Some(project_id) = project_id {
        if !ProjectRepo::exists(&state.pool, project_id).await? {
            push_field_error(&mut errors, "project_id", "The selected project id is invalid.");
        }
    }

    if !input.invoice_number.is_empty()
        && InvoiceRepo::invoice_number_taken(&state.pool, &input.invoice_number, current_id)
            .await?
    {
        push_field_error(
            &mut errors,
            "invoice_number",
            "The invoice number has already been taken.",
        );
    }

    if let Some(upload) = &form.attachment {
        if let Err(e) = validate_attachment(&upload.file_name, upload.bytes.len()) {
            merge_field_errors(&mut errors, e)?;
        }
    }

    into_result(errors)?;
    Ok(input)
}

async fn store_attachment(state: &AppState, form: &InvoiceForm) -> AppResult<Option<String>> {
    let Some(upload) = &form.attachment else {
        return Ok(None);
    };
    let name = state
        .attachments
        .save(&upload.file_name, &upload.bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store attachment: {e}")))?;
    Ok(Some(name))
}

async fn discard(state: &AppState, attachment: Option<&str>) {
    if let Some(name) = attachment {
        state.attachments.remove(name).await;
    }
}

async fn project_options(state: &AppState) -> Result<Vec<ProjectOption>, sqlx::Error> {
    state
        .cache
        .remember(keys::PROJECTS_LIST, || ProjectRepo::list_options(&state.pool))
        .await
}

fn log_change(message: &'static str, change: &InvoiceChange) {
    for total in &change.totals {
        tracing::info!(
            invoice_id = change.invoice.id,
            project_id = total.project_id,
            project_total = %total.total,
            rows_updated = total.rows_updated,
            "{message}"
        );
    }
}
