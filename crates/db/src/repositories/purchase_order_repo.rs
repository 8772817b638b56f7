//! Repository for the `purchase_orders` table.

use opsboard_core::purchase_order::{stale_categories, FanOutUpdate};
use opsboard_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::purchase_order::{
    FanOutWrite, PurchaseOrder, PurchaseOrderDetail, PurchaseOrderInput, PurchaseOrderUpdate,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, category_id, supplier_id, po_number, value, date, status, \
                       updates, notes, created_at, updated_at";

/// Joined select list. `all_categories` spans every row sharing the PO number.
const DETAIL_SELECT: &str = "SELECT po.id, po.project_id, po.category_id, po.supplier_id, \
        po.po_number, po.value, po.date, po.status, po.updates, po.notes, \
        po.created_at, po.updated_at, \
        p.pr_number, p.name AS project_name, c.name AS category_name, \
        s.name AS supplier_name, \
        (SELECT string_agg(DISTINCT c2.name, ', ' ORDER BY c2.name) \
           FROM purchase_orders po2 \
           JOIN categories c2 ON c2.id = po2.category_id \
          WHERE po2.po_number = po.po_number) AS all_categories \
     FROM purchase_orders po \
     LEFT JOIN projects p ON p.id = po.project_id \
     LEFT JOIN categories c ON c.id = po.category_id \
     LEFT JOIN suppliers s ON s.id = po.supplier_id";

/// Provides fan-out writes and joined reads for purchase orders.
pub struct PurchaseOrderRepo;

impl PurchaseOrderRepo {
    /// Insert one row per category, all sharing the submitted fields.
    ///
    /// `categories` must already be de-duplicated. The PO number is claimed
    /// inside the transaction, so of two concurrent submissions with the same
    /// number only the first is written.
    pub async fn create_fan_out(
        pool: &PgPool,
        input: &PurchaseOrderInput,
        categories: &[DbId],
    ) -> Result<FanOutWrite<Vec<PurchaseOrder>>, sqlx::Error> {
        let po_number = input.po_number.trim();
        let mut tx = pool.begin().await?;
        Self::lock_po_number(&mut tx, po_number).await?;
        if Self::po_number_exists(&mut tx, po_number).await? {
            return Ok(FanOutWrite::NumberTaken);
        }

        let mut rows = Vec::with_capacity(categories.len());
        for &category_id in categories {
            rows.push(Self::insert_inner(&mut tx, input, category_id).await?);
        }
        tx.commit().await?;
        Ok(FanOutWrite::Written(rows))
    }

    /// Apply `plan` to row `id` and its group.
    ///
    /// Returns `None` if no row with the given `id` exists. Moving the row to
    /// a PO number held by another group yields [`FanOutWrite::NumberTaken`].
    pub async fn update_fan_out(
        pool: &PgPool,
        id: DbId,
        input: &PurchaseOrderInput,
        plan: &FanOutUpdate,
    ) -> Result<Option<FanOutWrite<PurchaseOrderUpdate>>, sqlx::Error> {
        let po_number = input.po_number.trim();
        let mut tx = pool.begin().await?;
        Self::lock_po_number(&mut tx, po_number).await?;

        let query = format!("SELECT {COLUMNS} FROM purchase_orders WHERE id = $1 FOR UPDATE");
        let Some(existing) = sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        if existing.po_number != po_number && Self::po_number_exists(&mut tx, po_number).await? {
            return Ok(Some(FanOutWrite::NumberTaken));
        }

        let query = format!(
            "SELECT {COLUMNS} FROM purchase_orders
             WHERE po_number = $1 AND id <> $2
             ORDER BY id"
        );
        let siblings = sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(&existing.po_number)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        let query = format!(
            "UPDATE purchase_orders SET
                project_id = $2,
                category_id = $3,
                supplier_id = $4,
                po_number = $5,
                value = $6,
                date = $7,
                status = $8,
                updates = $9,
                notes = $10
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(id)
            .bind(input.project_id)
            .bind(plan.in_place)
            .bind(input.supplier_id)
            .bind(po_number)
            .bind(input.value)
            .bind(input.date)
            .bind(&input.status)
            .bind(&input.updates)
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        let mut created = Vec::with_capacity(plan.additional.len());
        for &category_id in &plan.additional {
            created.push(Self::insert_inner(&mut tx, input, category_id).await?);
        }

        tx.commit().await?;

        let mut submitted = Vec::with_capacity(plan.additional.len() + 1);
        submitted.push(plan.in_place);
        submitted.extend_from_slice(&plan.additional);
        let existing_categories: Vec<DbId> = siblings.iter().map(|r| r.category_id).collect();
        let dropped = stale_categories(&existing_categories, &submitted);
        let stale = siblings
            .into_iter()
            .filter(|r| dropped.contains(&r.category_id))
            .collect();

        Ok(Some(FanOutWrite::Written(PurchaseOrderUpdate {
            updated,
            created,
            stale,
        })))
    }

    /// Find a purchase order by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PurchaseOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM purchase_orders WHERE id = $1");
        sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a purchase order with its joined names.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PurchaseOrderDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE po.id = $1");
        sqlx::query_as::<_, PurchaseOrderDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Index listing, most recently created first.
    pub async fn list_latest(pool: &PgPool) -> Result<Vec<PurchaseOrderDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} ORDER BY po.created_at DESC, po.id DESC");
        sqlx::query_as::<_, PurchaseOrderDetail>(&query)
            .fetch_all(pool)
            .await
    }

    /// Export and print listing, in insertion order.
    pub async fn list_for_export(pool: &PgPool) -> Result<Vec<PurchaseOrderDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} ORDER BY po.id");
        sqlx::query_as::<_, PurchaseOrderDetail>(&query)
            .fetch_all(pool)
            .await
    }

    /// All rows sharing a PO number.
    pub async fn list_by_po_number(
        pool: &PgPool,
        po_number: &str,
    ) -> Result<Vec<PurchaseOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM purchase_orders WHERE po_number = $1 ORDER BY id");
        sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(po_number)
            .fetch_all(pool)
            .await
    }

    /// Whether `po_number` is used outside the group currently named
    /// `own_group` (the edited row's PO number, if any).
    pub async fn po_number_taken(
        pool: &PgPool,
        po_number: &str,
        own_group: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let po_number = po_number.trim();
        if own_group == Some(po_number) {
            return Ok(false);
        }
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM purchase_orders WHERE po_number = $1)",
        )
        .bind(po_number)
        .fetch_one(pool)
        .await
    }

    /// Delete one row. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Serialize writers of one PO number until the transaction ends.
    async fn lock_po_number(conn: &mut PgConnection, po_number: &str) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(po_number)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn po_number_exists(conn: &mut PgConnection, po_number: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM purchase_orders WHERE po_number = $1)",
        )
        .bind(po_number)
        .fetch_one(&mut *conn)
        .await
    }

    async fn insert_inner(
        conn: &mut PgConnection,
        input: &PurchaseOrderInput,
        category_id: DbId,
    ) -> Result<PurchaseOrder, sqlx::Error> {
        let query = format!(
            "INSERT INTO purchase_orders
                (project_id, category_id, supplier_id, po_number, value, date,
                 status, updates, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(input.project_id)
            .bind(category_id)
            .bind(input.supplier_id)
            .bind(input.po_number.trim())
            .bind(input.value)
            .bind(input.date)
            .bind(&input.status)
            .bind(&input.updates)
            .bind(&input.notes)
            .fetch_one(&mut *conn)
            .await
    }
}
