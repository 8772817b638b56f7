//! Repository for the `invoices` table.
//!
//! Every write runs in one transaction that locks the affected project rows,
//! writes the invoice, then recomputes `project_total` for each affected
//! group through [`TxLedger`].
//!
//! Lock order is always project rows (ascending id) before any invoice row.
//! Recomputing a total rewrites every invoice of the group, so taking an
//! invoice row lock first would cycle with a concurrent create.

use async_trait::async_trait;
use opsboard_core::invoice_totals::{lock_scope, recompute_totals, InvoiceLedger, TotalsScope};
use opsboard_core::types::DbId;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::models::invoice::{
    Invoice, InvoiceChange, InvoiceInput, InvoiceRemoval, InvoiceWithProject,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, invoice_number, project_id, value, project_total, status, attachment, \
                       created_at, updated_at";

/// Joined columns for listings; `i` is `invoices`, `p` is `projects`.
const JOINED_COLUMNS: &str = "i.id, i.invoice_number, i.project_id, i.value, i.project_total, \
                              i.status, i.attachment, i.created_at, i.updated_at, \
                              p.pr_number, p.name AS project_name, p.value AS project_value";

/// [`InvoiceLedger`] over an open connection, normally a transaction.
pub struct TxLedger<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> TxLedger<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl InvoiceLedger for TxLedger<'_> {
    type Error = sqlx::Error;

    async fn lock_projects(&mut self, project_ids: &[DbId]) -> Result<(), sqlx::Error> {
        // One statement per id keeps the acquisition order explicit.
        for &id in project_ids {
            sqlx::query("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *self.conn)
                .await?;
        }
        Ok(())
    }

    async fn sum_values(&mut self, project_id: DbId) -> Result<Decimal, sqlx::Error> {
        sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(value), 0) FROM invoices WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_one(&mut *self.conn)
        .await
    }

    async fn write_total(&mut self, project_id: DbId, total: Decimal) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE invoices SET project_total = $2 WHERE project_id = $1")
            .bind(project_id)
            .bind(total)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Provides CRUD operations for invoices.
pub struct InvoiceRepo;

impl InvoiceRepo {
    /// Insert an invoice and refresh its project's total.
    pub async fn create(
        pool: &PgPool,
        input: &InvoiceInput,
        attachment: Option<&str>,
    ) -> Result<InvoiceChange, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let scope = TotalsScope::created(input.project_id);
        lock_scope(&mut TxLedger::new(&mut tx), &scope).await?;

        let id = sqlx::query_scalar::<_, DbId>(
            "INSERT INTO invoices (invoice_number, project_id, value, status, attachment)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(input.invoice_number.trim())
        .bind(input.project_id)
        .bind(input.value)
        .bind(&input.status)
        .bind(attachment)
        .fetch_one(&mut *tx)
        .await?;

        let totals = recompute_totals(&mut TxLedger::new(&mut tx), &scope).await?;
        let invoice = Self::fetch_inner(&mut tx, id).await?;

        tx.commit().await?;
        tracing::debug!(invoice_id = id, project_id = input.project_id, "Invoice created");
        Ok(InvoiceChange {
            invoice,
            totals,
            replaced_attachment: None,
        })
    }

    /// Update an invoice, refreshing both groups if it moved to another
    /// project. A `Some` attachment replaces the stored one.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &InvoiceInput,
        attachment: Option<&str>,
    ) -> Result<Option<InvoiceChange>, sqlx::Error> {
        let Some((mut tx, existing, scope)) = Self::lock_existing(pool, id, |current| {
            TotalsScope::updated(current.project_id, input.project_id)
        })
        .await?
        else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE invoices SET
                invoice_number = $2,
                project_id = $3,
                value = $4,
                status = $5,
                attachment = COALESCE($6, attachment)
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.invoice_number.trim())
        .bind(input.project_id)
        .bind(input.value)
        .bind(&input.status)
        .bind(attachment)
        .execute(&mut *tx)
        .await?;

        let totals = recompute_totals(&mut TxLedger::new(&mut tx), &scope).await?;
        let invoice = Self::fetch_inner(&mut tx, id).await?;

        tx.commit().await?;

        if scope.is_move() {
            tracing::debug!(
                invoice_id = id,
                from_project = existing.project_id,
                to_project = input.project_id,
                "Invoice moved between projects"
            );
        }

        let replaced_attachment = match attachment {
            Some(_) => existing.attachment,
            None => None,
        };
        Ok(Some(InvoiceChange {
            invoice,
            totals,
            replaced_attachment,
        }))
    }

    /// Delete an invoice and refresh the remaining group's total.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<InvoiceRemoval>, sqlx::Error> {
        let Some((mut tx, invoice, scope)) =
            Self::lock_existing(pool, id, |current| TotalsScope::deleted(current.project_id))
                .await?
        else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let totals = recompute_totals(&mut TxLedger::new(&mut tx), &scope).await?;
        tx.commit().await?;
        Ok(Some(InvoiceRemoval { invoice, totals }))
    }

    /// Find an invoice by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE id = $1");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an invoice joined with its project.
    pub async fn find_with_project(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<InvoiceWithProject>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS}
             FROM invoices i
             LEFT JOIN projects p ON p.id = i.project_id
             WHERE i.id = $1"
        );
        sqlx::query_as::<_, InvoiceWithProject>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All invoices joined with their project, in insertion order.
    pub async fn list_with_project(pool: &PgPool) -> Result<Vec<InvoiceWithProject>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS}
             FROM invoices i
             LEFT JOIN projects p ON p.id = i.project_id
             ORDER BY i.id"
        );
        sqlx::query_as::<_, InvoiceWithProject>(&query)
            .fetch_all(pool)
            .await
    }

    /// Invoices of one project.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE project_id = $1 ORDER BY id");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Whether another invoice already uses `invoice_number`.
    pub async fn invoice_number_taken(
        pool: &PgPool,
        invoice_number: &str,
        except_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM invoices
                WHERE invoice_number = $1 AND ($2::BIGINT IS NULL OR id <> $2)
             )",
        )
        .bind(invoice_number.trim())
        .bind(except_id)
        .fetch_one(pool)
        .await
    }

    /// Open a transaction holding the project locks for `scope_of(invoice)`
    /// and then the invoice row itself.
    ///
    /// The invoice is read unlocked to learn its project. If it moved before
    /// the row lock was taken, the transaction is dropped and the sequence
    /// starts over with the new project.
    async fn lock_existing<F>(
        pool: &PgPool,
        id: DbId,
        scope_of: F,
    ) -> Result<Option<(Transaction<'static, Postgres>, Invoice, TotalsScope)>, sqlx::Error>
    where
        F: Fn(&Invoice) -> TotalsScope,
    {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE id = $1 FOR UPDATE");
        loop {
            let Some(seen) = Self::find_by_id(pool, id).await? else {
                return Ok(None);
            };
            let scope = scope_of(&seen);

            let mut tx = pool.begin().await?;
            lock_scope(&mut TxLedger::new(&mut tx), &scope).await?;

            let locked = sqlx::query_as::<_, Invoice>(&query)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            match locked {
                None => return Ok(None),
                Some(current) if current.project_id == seen.project_id => {
                    return Ok(Some((tx, current, scope)));
                }
                Some(current) => {
                    tracing::debug!(
                        invoice_id = id,
                        seen_project = seen.project_id,
                        current_project = current.project_id,
                        "Invoice moved while locking, retrying"
                    );
                    tx.rollback().await?;
                }
            }
        }
    }

    async fn fetch_inner(conn: &mut PgConnection, id: DbId) -> Result<Invoice, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE id = $1");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .fetch_one(&mut *conn)
            .await
    }
}
