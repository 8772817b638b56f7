//! Route definitions for the `/invoices` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use opsboard_core::upload::MAX_ATTACHMENT_BYTES;

use crate::handlers::invoice;
use crate::state::AppState;

/// Room for the text fields and multipart framing around a maximal file.
const FORM_OVERHEAD_BYTES: usize = 2 * 1024 * 1024;

/// Routes mounted at `/invoices`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> create        (multipart/form-data)
/// GET    /create        -> create_form
/// GET    /export/pdf    -> export_pdf
/// GET    /print         -> print
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update        (multipart/form-data)
/// DELETE /{id}          -> delete
/// GET    /{id}/edit     -> edit_form
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(invoice::list).post(invoice::create))
        .route("/create", get(invoice::create_form))
        .route("/export/pdf", get(invoice::export_pdf))
        .route("/print", get(invoice::print))
        .route(
            "/{id}",
            get(invoice::get_by_id)
                .put(invoice::update)
                .delete(invoice::delete),
        )
        .route("/{id}/edit", get(invoice::edit_form))
        .layer(DefaultBodyLimit::max(
            MAX_ATTACHMENT_BYTES + FORM_OVERHEAD_BYTES,
        ))
}
