pub mod health;
pub mod invoice;
pub mod project;
pub mod purchase_order;
pub mod report;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects                                 list, create
/// /projects/options                         cached dropdown options
/// /projects/{id}                            get, update, delete
///
/// /invoices                                 list, create (multipart)
/// /invoices/create                          form options
/// /invoices/export/pdf                      PDF export
/// /invoices/print                           print view
/// /invoices/{id}                            get, update (multipart), delete
/// /invoices/{id}/edit                       record + form options
///
/// /purchase-orders                          list, create (fan-out)
/// /purchase-orders/create                   form options
/// /purchase-orders/categories/{project_id}  categories of a project
/// /purchase-orders/export/pdf               PDF export
/// /purchase-orders/print                    print view
/// /purchase-orders/{id}                     get, update, delete
/// /purchase-orders/{id}/edit                record + form options
///
/// /reports                                  filtered list, create
/// /reports/export                           CSV export
/// /reports/cache/clear                      drop cached filter options
/// /reports/{customer,vendor,supplier,pm,am}-projects   lookups
/// /reports/{id}                             get, update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/invoices", invoice::router())
        .nest("/purchase-orders", purchase_order::router())
        .nest("/reports", report::router())
}
