//! Route definitions for the `/reports` resource and the project lookups.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{lookup, report};
use crate::state::AppState;

/// Routes mounted at `/reports`.
///
/// ```text
/// GET    /                       -> list (filters in the query string)
/// POST   /                       -> create
/// GET    /export                 -> export (CSV, same filters as list)
/// POST   /cache/clear            -> clear_cache
/// GET    /customer-projects      -> lookup::customer_projects
/// GET    /vendor-projects        -> lookup::vendor_projects
/// GET    /supplier-projects      -> lookup::supplier_projects
/// GET    /pm-projects            -> lookup::pm_projects
/// GET    /am-projects            -> lookup::am_projects
/// GET    /{id}                   -> get_by_id
/// PUT    /{id}                   -> update
/// DELETE /{id}                   -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(report::list).post(report::create))
        .route("/export", get(report::export))
        .route("/cache/clear", post(report::clear_cache))
        .route("/customer-projects", get(lookup::customer_projects))
        .route("/vendor-projects", get(lookup::vendor_projects))
        .route("/supplier-projects", get(lookup::supplier_projects))
        .route("/pm-projects", get(lookup::pm_projects))
        .route("/am-projects", get(lookup::am_projects))
        .route(
            "/{id}",
            get(report::get_by_id)
                .put(report::update)
                .delete(report::delete),
        )
}
