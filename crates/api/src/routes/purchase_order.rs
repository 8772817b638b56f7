//! Route definitions for the `/purchase-orders` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::purchase_order;
use crate::state::AppState;

/// Routes mounted at `/purchase-orders`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /create                    -> create_form
/// GET    /categories/{project_id}   -> categories_by_project
/// GET    /export/pdf                -> export_pdf
/// GET    /print                     -> print
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> delete
/// GET    /{id}/edit                 -> edit_form
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(purchase_order::list).post(purchase_order::create))
        .route("/create", get(purchase_order::create_form))
        .route(
            "/categories/{project_id}",
            get(purchase_order::categories_by_project),
        )
        .route("/export/pdf", get(purchase_order::export_pdf))
        .route("/print", get(purchase_order::print))
        .route(
            "/{id}",
            get(purchase_order::get_by_id)
                .put(purchase_order::update)
                .delete(purchase_order::delete),
        )
        .route("/{id}/edit", get(purchase_order::edit_form))
}
