//! Application router: routes plus the middleware every request passes.
//!
//! `main.rs` and `tests/common/mod.rs` both call [`build_app_router`], so the
//! tests exercise the production stack.

use std::time::Duration;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the dashboard [`Router`].
///
/// Layers run outermost first on the way in:
///
/// 1. CORS, so preflights from the dashboard origin never reach a handler
/// 2. request id assignment
/// 3. request/response tracing, tagged with that id
/// 4. request id echoed on the response
/// 5. timeout (`REQUEST_TIMEOUT_SECS`), which also bounds PDF rendering
/// 6. panic recovery
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .fallback(route_not_found)
        // 6. A panicking handler becomes a 500 instead of a dropped connection.
        .layer(CatchPanicLayer::new())
        // 5.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // 4.
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        // 3. Spans carry method, path and the request id header.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // 2. Keeps a caller-supplied id, otherwise assigns a UUID.
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        // 1.
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// CORS for the dashboard front-end.
///
/// Exports are fetched cross-origin and named from `Content-Disposition`, so
/// that header is exposed. Panics at startup on an unparsable origin.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([CONTENT_DISPOSITION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Unknown paths answer with the same `{error, code}` body as handler errors.
async fn route_not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": format!("No route for {}", uri.path()),
            "code": "NOT_FOUND",
        })),
    )
}
