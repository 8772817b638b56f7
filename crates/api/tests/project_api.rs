//! HTTP-level tests for the `/projects` resource.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    body_json, build_test_app, create_project, delete, get, multipart, post_json, put_json,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn create_and_fetch(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(
        app.clone(),
        "/api/v1/projects",
        json!({"pr_number": "PR-1", "name": "Core", "value": "12.5"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Project created successfully");
    assert_eq!(json["data"]["value"], "12.50");
    let id = json["data"]["id"].as_i64().unwrap();

    let json = body_json(get(app, &format!("/api/v1/projects/{id}")).await).await;
    assert_eq!(json["data"]["pr_number"], "PR-1");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_pr_number_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);
    create_project(app.clone(), "PR-1", "1").await;
    let other = create_project(app.clone(), "PR-2", "1").await;

    let response = post_json(
        app.clone(),
        "/api/v1/projects",
        json!({"pr_number": "PR-1", "name": "Again", "value": "1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["fields"]["pr_number"][0],
        "The pr number has already been taken."
    );

    let response = put_json(
        app,
        &format!("/api/v1/projects/{other}"),
        json!({"pr_number": "PR-1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn options_are_refreshed_after_rename(pool: PgPool) {
    let app = build_test_app(pool);
    let id = create_project(app.clone(), "PR-1", "1").await;

    let json = body_json(get(app.clone(), "/api/v1/projects/options").await).await;
    assert_eq!(json["data"][0]["name"], "Project PR-1");

    let response = put_json(
        app.clone(),
        &format!("/api/v1/projects/{id}"),
        json!({"name": "Renamed"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(app, "/api/v1/projects/options").await).await;
    assert_eq!(json["data"][0]["name"], "Renamed");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn referenced_project_cannot_be_deleted(pool: PgPool) {
    let uploads = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_uploads(pool, uploads.path());
    let id = create_project(app.clone(), "PR-R", "1").await;
    let project = id.to_string();
    let response = multipart(
        app.clone(),
        Method::POST,
        "/api/v1/invoices",
        &[
            ("invoice_number", "R-1"),
            ("value", "1"),
            ("project_id", project.as_str()),
            ("status", "Paid"),
        ],
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = delete(app.clone(), &format!("/api/v1/projects/{id}")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = delete(app, "/api/v1/projects/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
