//! HTTP-level tests for the `/purchase-orders` resource.

mod common;

use axum::http::StatusCode;
use common::{body_json, body_text, build_test_app, create_project, delete, get, post_json, put_json};
use opsboard_db::models::directory::DirectoryKind;
use opsboard_db::repositories::{CategoryRepo, DirectoryRepo};
use serde_json::json;
use sqlx::PgPool;

struct Seed {
    project_id: i64,
    supplier_id: i64,
    categories: Vec<i64>,
}

async fn seed(pool: &PgPool, app: axum::Router) -> Seed {
    let project_id = create_project(app, "PR-PO", "1000").await;
    let supplier_id = DirectoryRepo::create(pool, DirectoryKind::Supplier, "Delta Supply")
        .await
        .unwrap()
        .id;
    let mut categories = Vec::new();
    for name in ["Cabling", "Racks", "Licenses"] {
        categories.push(
            CategoryRepo::create(pool, Some(project_id), name)
                .await
                .unwrap()
                .id,
        );
    }
    Seed {
        project_id,
        supplier_id,
        categories,
    }
}

fn submission(seed: &Seed, po_number: &str, categories: &[i64]) -> serde_json::Value {
    json!({
        "project_id": seed.project_id,
        "supplier_id": seed.supplier_id,
        "category_ids": categories,
        "po_number": po_number,
        "value": "1500.00",
        "date": "2025-02-01",
        "status": "Open",
    })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn store_creates_one_row_per_distinct_category(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let seed = seed(&pool, app.clone()).await;
    let (c1, c2) = (seed.categories[0], seed.categories[1]);

    let response = post_json(
        app.clone(),
        "/api/v1/purchase-orders",
        submission(&seed, "PO-77", &[c1, c2, c1]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(
        json["message"],
        "Successfully created 2 PPO record(s) for the selected categories"
    );
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["po_number"] == "PO-77"));
    assert_eq!(rows[0]["category_id"], c1);
    assert_eq!(rows[1]["category_id"], c2);

    let list = body_json(get(app, "/api/v1/purchase-orders").await).await;
    let listed = list["data"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["all_categories"], "Cabling, Racks");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn store_rejects_empty_categories_and_unknown_refs(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let seed = seed(&pool, app.clone()).await;

    let mut body = submission(&seed, "", &[]);
    body["supplier_id"] = json!(999_999);
    body["value"] = json!("-1");
    let response = post_json(app, "/api/v1/purchase-orders", body).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    let fields = &json["fields"];
    assert_eq!(
        fields["category_ids"][0],
        "At least one category must be selected."
    );
    assert_eq!(fields["supplier_id"][0], "The selected supplier id is invalid.");
    assert_eq!(fields["po_number"][0], "The po number field is required.");
    assert_eq!(fields["value"][0], "The value must be at least 0.");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn po_number_must_be_unique_across_groups(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let seed = seed(&pool, app.clone()).await;
    let c1 = seed.categories[0];

    post_json(app.clone(), "/api/v1/purchase-orders", submission(&seed, "PO-1", &[c1])).await;
    let response = post_json(app, "/api/v1/purchase-orders", submission(&seed, "PO-1", &[c1])).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["fields"]["po_number"][0],
        "The po number has already been taken."
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_adds_rows_and_reports_stale_siblings(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let seed = seed(&pool, app.clone()).await;
    let (c1, c2, c3) = (seed.categories[0], seed.categories[1], seed.categories[2]);

    let created = body_json(
        post_json(
            app.clone(),
            "/api/v1/purchase-orders",
            submission(&seed, "PO-9", &[c1, c2]),
        )
        .await,
    )
    .await;
    let first_id = created["data"][0]["id"].as_i64().unwrap();

    // Keep the PO number, swap c2 for c3.
    let response = put_json(
        app.clone(),
        &format!("/api/v1/purchase-orders/{first_id}"),
        submission(&seed, "PO-9", &[c1, c3]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["message"],
        "PPO has been updated successfully and 1 additional record(s) created for other categories"
    );
    assert_eq!(json["data"]["updated"]["category_id"], c1);
    assert_eq!(json["data"]["created"][0]["category_id"], c3);
    let stale = json["data"]["stale"].as_array().unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0]["category_id"], c2);

    // The stale row is still there.
    let list = body_json(get(app, "/api/v1/purchase-orders").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn edit_form_preselects_group_categories(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let seed = seed(&pool, app.clone()).await;
    let (c1, c2) = (seed.categories[0], seed.categories[1]);

    let created = body_json(
        post_json(
            app.clone(),
            "/api/v1/purchase-orders",
            submission(&seed, "PO-E", &[c2, c1]),
        )
        .await,
    )
    .await;
    let id = created["data"][0]["id"].as_i64().unwrap();

    let json = body_json(get(app, &format!("/api/v1/purchase-orders/{id}/edit")).await).await;
    assert_eq!(json["data"]["selected_category_ids"], json!([c2, c1]));
    assert_eq!(json["data"]["suppliers"][0]["name"], "Delta Supply");
    assert_eq!(json["data"]["categories"].as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn destroy_names_the_po_number(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let seed = seed(&pool, app.clone()).await;

    let created = body_json(
        post_json(
            app.clone(),
            "/api/v1/purchase-orders",
            submission(&seed, "PO-DEL", &[seed.categories[0]]),
        )
        .await,
    )
    .await;
    let id = created["data"][0]["id"].as_i64().unwrap();

    let response = delete(app.clone(), &format!("/api/v1/purchase-orders/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "PPO \"PO-DEL\" has been deleted successfully"
    );

    let response = get(app, &format!("/api/v1/purchase-orders/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn categories_for_project_use_success_envelope(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let seed = seed(&pool, app.clone()).await;

    let json = body_json(
        get(
            app,
            &format!("/api/v1/purchase-orders/categories/{}", seed.project_id),
        )
        .await,
    )
    .await;
    assert_eq!(json["success"], true);
    let names: Vec<&str> = json["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Cabling", "Licenses", "Racks"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn pdf_lists_all_group_categories(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let seed = seed(&pool, app.clone()).await;
    post_json(
        app.clone(),
        "/api/v1/purchase-orders",
        submission(&seed, "PO-PDF", &[seed.categories[0], seed.categories[1]]),
    )
    .await;

    let response = get(app.clone(), "/api/v1/purchase-orders/export/pdf").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert!(response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("PPOs_"));

    let html = body_text(get(app, "/api/v1/purchase-orders/print").await).await;
    assert!(html.contains("Project Purchase Orders Management"));
    assert!(html.contains("Cabling, Racks"));
    assert!(html.contains("$1,500.00"));
}
