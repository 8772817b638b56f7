//! Multi-category purchase order fan-out against a real database.

use opsboard_core::purchase_order::{distinct_categories, plan_update};
use opsboard_core::types::DbId;
use opsboard_db::models::directory::DirectoryKind;
use opsboard_db::models::project::CreateProject;
use opsboard_db::models::purchase_order::{FanOutWrite, PurchaseOrder, PurchaseOrderInput};
use opsboard_db::repositories::{CategoryRepo, DirectoryRepo, ProjectRepo, PurchaseOrderRepo};
use rust_decimal::Decimal;
use sqlx::PgPool;

struct Fixture {
    project_id: DbId,
    supplier_id: DbId,
    categories: Vec<DbId>,
}

async fn fixture(pool: &PgPool) -> Fixture {
    let project = ProjectRepo::create(
        pool,
        &CreateProject {
            pr_number: "PR-PO".into(),
            name: "Fit-out".into(),
            value: Decimal::new(5_000, 0),
            customer_id: None,
            vendor_id: None,
            pm_id: None,
            am_id: None,
            customer_po: None,
            customer_po_deadline: None,
            supplier_ids: vec![],
        },
    )
    .await
    .unwrap();
    let supplier = DirectoryRepo::create(pool, DirectoryKind::Supplier, "Delta DS")
        .await
        .unwrap();

    let mut categories = Vec::new();
    for name in ["Cabling", "Cameras", "Racks", "Switches"] {
        categories.push(
            CategoryRepo::create(pool, Some(project.id), name)
                .await
                .unwrap()
                .id,
        );
    }

    Fixture {
        project_id: project.id,
        supplier_id: supplier.id,
        categories,
    }
}

fn input(f: &Fixture, po_number: &str, category_ids: Vec<DbId>) -> PurchaseOrderInput {
    PurchaseOrderInput {
        project_id: f.project_id,
        category_ids,
        supplier_id: f.supplier_id,
        po_number: po_number.into(),
        value: Some(Decimal::new(1_500_00, 2)),
        date: None,
        status: Some("Ordered".into()),
        updates: None,
        notes: None,
    }
}

async fn create(pool: &PgPool, input: &PurchaseOrderInput, categories: &[DbId]) -> Vec<PurchaseOrder> {
    match PurchaseOrderRepo::create_fan_out(pool, input, categories).await.unwrap() {
        FanOutWrite::Written(rows) => rows,
        FanOutWrite::NumberTaken => panic!("PO number {} already taken", input.po_number),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn n_categories_yield_n_rows_sharing_the_po_number(pool: PgPool) {
    let f = fixture(&pool).await;
    let submitted = vec![f.categories[0], f.categories[1], f.categories[0], f.categories[2]];
    let categories = distinct_categories(&submitted).unwrap();

    let rows = create(&pool, &input(&f, "PO-7", submitted), &categories).await;

    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.po_number == "PO-7"));
    let mut seen: Vec<DbId> = rows.iter().map(|r| r.category_id).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 3);

    let group = PurchaseOrderRepo::list_by_po_number(&pool, "PO-7").await.unwrap();
    assert_eq!(group.len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn update_keeps_row_for_first_category_and_adds_the_rest(pool: PgPool) {
    let f = fixture(&pool).await;
    let rows = create(
        &pool,
        &input(&f, "PO-8", vec![f.categories[0], f.categories[1]]),
        &[f.categories[0], f.categories[1]],
    )
    .await;
    let edited = rows[0].id;

    let submitted = vec![f.categories[2], f.categories[3]];
    let plan = plan_update(&submitted).unwrap();
    let Some(FanOutWrite::Written(outcome)) =
        PurchaseOrderRepo::update_fan_out(&pool, edited, &input(&f, "PO-8", submitted), &plan)
            .await
            .unwrap()
    else {
        panic!("edit of PO-8 was not written");
    };

    assert_eq!(outcome.updated.id, edited);
    assert_eq!(outcome.updated.category_id, f.categories[2]);
    assert_eq!(outcome.created.len(), 1);
    assert_eq!(outcome.created[0].category_id, f.categories[3]);

    // The sibling for the dropped category survives and is reported.
    assert_eq!(outcome.stale.len(), 1);
    assert_eq!(outcome.stale[0].category_id, f.categories[1]);
    let group = PurchaseOrderRepo::list_by_po_number(&pool, "PO-8").await.unwrap();
    assert_eq!(group.len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn detail_lists_every_category_of_the_po_number(pool: PgPool) {
    let f = fixture(&pool).await;
    let rows = create(&pool, &input(&f, "PO-9", vec![]), &[f.categories[1], f.categories[0]]).await;

    let detail = PurchaseOrderRepo::find_detail(&pool, rows[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.all_categories.as_deref(), Some("Cabling, Cameras"));
    assert_eq!(detail.supplier_name.as_deref(), Some("Delta DS"));
    assert_eq!(detail.pr_number.as_deref(), Some("PR-PO"));
}

#[sqlx::test(migrations = "./migrations")]
async fn po_number_uniqueness_ignores_own_group(pool: PgPool) {
    let f = fixture(&pool).await;
    create(&pool, &input(&f, "PO-10", vec![]), &[f.categories[0]]).await;

    assert!(PurchaseOrderRepo::po_number_taken(&pool, "PO-10", None).await.unwrap());
    assert!(!PurchaseOrderRepo::po_number_taken(&pool, "PO-10", Some("PO-10"))
        .await
        .unwrap());
    assert!(PurchaseOrderRepo::po_number_taken(&pool, "PO-10", Some("PO-11"))
        .await
        .unwrap());
    assert!(!PurchaseOrderRepo::po_number_taken(&pool, "PO-12", None).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn missing_category_ids_are_reported(pool: PgPool) {
    let f = fixture(&pool).await;
    let missing = CategoryRepo::missing_ids(&pool, &[f.categories[0], 999_999])
        .await
        .unwrap();
    assert_eq!(missing, vec![999_999]);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_creates_with_one_po_number_write_a_single_group(pool: PgPool) {
    let f = fixture(&pool).await;
    let submission = input(&f, "PO-RACE", vec![]);
    let categories = [f.categories[0], f.categories[1]];

    let mut handles = Vec::new();
    for _ in 0..6 {
        let pool = pool.clone();
        let submission = submission.clone();
        handles.push(tokio::spawn(async move {
            PurchaseOrderRepo::create_fan_out(&pool, &submission, &categories).await
        }));
    }

    let mut written = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            FanOutWrite::Written(rows) => {
                assert_eq!(rows.len(), 2);
                written += 1;
            }
            FanOutWrite::NumberTaken => {}
        }
    }

    assert_eq!(written, 1);
    let group = PurchaseOrderRepo::list_by_po_number(&pool, "PO-RACE").await.unwrap();
    assert_eq!(group.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn edit_cannot_take_another_groups_po_number(pool: PgPool) {
    let f = fixture(&pool).await;
    create(&pool, &input(&f, "PO-A", vec![]), &[f.categories[0]]).await;
    let b = create(&pool, &input(&f, "PO-B", vec![]), &[f.categories[1]]).await;

    let plan = plan_update(&[f.categories[1]]).unwrap();
    let outcome = PurchaseOrderRepo::update_fan_out(&pool, b[0].id, &input(&f, "PO-A", vec![]), &plan)
        .await
        .unwrap();
    assert!(matches!(outcome, Some(FanOutWrite::NumberTaken)));

    let unchanged = PurchaseOrderRepo::find_by_id(&pool, b[0].id).await.unwrap().unwrap();
    assert_eq!(unchanged.po_number, "PO-B");

    // Keeping its own number is fine.
    let outcome = PurchaseOrderRepo::update_fan_out(&pool, b[0].id, &input(&f, "PO-B", vec![]), &plan)
        .await
        .unwrap();
    assert!(matches!(outcome, Some(FanOutWrite::Written(_))));
}
