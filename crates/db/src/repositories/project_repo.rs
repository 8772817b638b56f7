//! Repository for the `projects` table and its supplier assignments.

use opsboard_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::directory::DirectoryKind;
use crate::models::project::{
    CreateProject, Project, ProjectOption, ProjectSummary, UpdateProject,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, pr_number, name, value, customer_id, vendor_id, pm_id, am_id, \
                       customer_po, customer_po_deadline, created_at, updated_at";

/// Provides CRUD and lookup queries for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project together with its supplier assignments.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO projects
                (pr_number, name, value, customer_id, vendor_id, pm_id, am_id,
                 customer_po, customer_po_deadline)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(input.pr_number.trim())
            .bind(input.name.trim())
            .bind(input.value)
            .bind(input.customer_id)
            .bind(input.vendor_id)
            .bind(input.pm_id)
            .bind(input.am_id)
            .bind(&input.customer_po)
            .bind(input.customer_po_deadline)
            .fetch_one(&mut *tx)
            .await?;

        Self::set_suppliers_inner(&mut tx, project.id, &input.supplier_ids).await?;

        tx.commit().await?;
        Ok(project)
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all projects, most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// `(id, pr_number, name)` of every project, ordered by PR number.
    pub async fn list_options(pool: &PgPool) -> Result<Vec<ProjectOption>, sqlx::Error> {
        sqlx::query_as::<_, ProjectOption>(
            "SELECT id, pr_number, name FROM projects ORDER BY pr_number",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Whether another project already uses `pr_number`.
    pub async fn pr_number_taken(
        pool: &PgPool,
        pr_number: &str,
        except_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM projects
                WHERE pr_number = $1 AND ($2::BIGINT IS NULL OR id <> $2)
             )",
        )
        .bind(pr_number.trim())
        .bind(except_id)
        .fetch_one(pool)
        .await
    }

    /// Supplier IDs assigned to the project, ascending.
    pub async fn supplier_ids(pool: &PgPool, id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT supplier_id FROM project_suppliers WHERE project_id = $1 ORDER BY supplier_id",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE projects SET
                pr_number = COALESCE($2, pr_number),
                name = COALESCE($3, name),
                value = COALESCE($4, value),
                customer_id = COALESCE($5, customer_id),
                vendor_id = COALESCE($6, vendor_id),
                pm_id = COALESCE($7, pm_id),
                am_id = COALESCE($8, am_id),
                customer_po = COALESCE($9, customer_po),
                customer_po_deadline = COALESCE($10, customer_po_deadline)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(input.pr_number.as_deref().map(str::trim))
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.value)
            .bind(input.customer_id)
            .bind(input.vendor_id)
            .bind(input.pm_id)
            .bind(input.am_id)
            .bind(&input.customer_po)
            .bind(input.customer_po_deadline)
            .fetch_optional(&mut *tx)
            .await?;

        if let (Some(project), Some(supplier_ids)) = (&project, &input.supplier_ids) {
            Self::set_suppliers_inner(&mut tx, project.id, supplier_ids).await?;
        }

        tx.commit().await?;
        Ok(project)
    }

    /// Delete a project. Fails with a foreign-key violation while invoices
    /// or purchase orders still reference it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Projects linked to a directory entry, most recent first, with the
    /// customer name and the joined supplier names.
    pub async fn list_for_directory(
        pool: &PgPool,
        kind: DirectoryKind,
        entry_id: DbId,
    ) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        let query = format!(
            "SELECT p.id, p.pr_number, p.name, p.value, p.customer_po,
                    p.customer_po_deadline,
                    c.name AS customer_name,
                    (SELECT string_agg(s.name, ', ' ORDER BY s.name)
                       FROM project_suppliers ps
                       JOIN suppliers s ON s.id = ps.supplier_id
                      WHERE ps.project_id = p.id) AS supplier_names
             FROM projects p
             LEFT JOIN customers c ON c.id = p.customer_id
             WHERE {}
             ORDER BY p.created_at DESC, p.id DESC",
            kind.project_predicate()
        );
        sqlx::query_as::<_, ProjectSummary>(&query)
            .bind(entry_id)
            .fetch_all(pool)
            .await
    }

    /// Distinct PR numbers, ascending.
    pub async fn pr_numbers(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT pr_number FROM projects ORDER BY pr_number")
            .fetch_all(pool)
            .await
    }

    /// Replace the supplier assignment of a project.
    async fn set_suppliers_inner(
        conn: &mut PgConnection,
        project_id: DbId,
        supplier_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM project_suppliers WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *conn)
            .await?;

        for &supplier_id in supplier_ids {
            sqlx::query(
                "INSERT INTO project_suppliers (project_id, supplier_id) VALUES ($1, $2)
                 ON CONFLICT (project_id, supplier_id) DO NOTHING",
            )
            .bind(project_id)
            .bind(supplier_id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}
