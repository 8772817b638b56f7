//! Repository for the `reports` table.

use opsboard_core::types::DbId;
use sqlx::PgPool;

use crate::models::directory::DirectoryKind;
use crate::models::report::{Report, ReportFilter, ReportFilterOptions, ReportInput};
use crate::repositories::{DirectoryRepo, ProjectRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, pr_number, project_name, project_manager, technologies, \
                       customer_name, customer_po, value, invoice_total, customer_po_deadline, \
                       actual_completion_percentage, vendors, suppliers, am, \
                       created_at, updated_at";

/// Provides CRUD and filtered listing for reports.
pub struct ReportRepo;

impl ReportRepo {
    pub async fn create(pool: &PgPool, input: &ReportInput) -> Result<Report, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports
                (pr_number, project_name, project_manager, technologies, customer_name,
                 customer_po, value, invoice_total, customer_po_deadline,
                 actual_completion_percentage, vendors, suppliers, am)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(&input.pr_number)
            .bind(&input.project_name)
            .bind(&input.project_manager)
            .bind(&input.technologies)
            .bind(&input.customer_name)
            .bind(&input.customer_po)
            .bind(input.value)
            .bind(input.invoice_total)
            .bind(input.customer_po_deadline)
            .bind(input.actual_completion_percentage)
            .bind(&input.vendors)
            .bind(&input.suppliers)
            .bind(&input.am)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Report>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE id = $1");
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Replace every field of a report with `input`.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &ReportInput,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!(
            "UPDATE reports SET
                pr_number = $2,
                project_name = $3,
                project_manager = $4,
                technologies = $5,
                customer_name = $6,
                customer_po = $7,
                value = $8,
                invoice_total = $9,
                customer_po_deadline = $10,
                actual_completion_percentage = $11,
                vendors = $12,
                suppliers = $13,
                am = $14
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .bind(&input.pr_number)
            .bind(&input.project_name)
            .bind(&input.project_manager)
            .bind(&input.technologies)
            .bind(&input.customer_name)
            .bind(&input.customer_po)
            .bind(input.value)
            .bind(input.invoice_total)
            .bind(input.customer_po_deadline)
            .bind(input.actual_completion_percentage)
            .bind(&input.vendors)
            .bind(&input.suppliers)
            .bind(&input.am)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reports matching `filter`, most recently created first.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &ReportFilter,
    ) -> Result<Vec<Report>, sqlx::Error> {
        let filter = filter.normalized();
        let query = format!(
            "SELECT {COLUMNS} FROM reports
             WHERE ($1::TEXT IS NULL OR pr_number ILIKE '%' || $1 || '%')
               AND ($2::TEXT IS NULL OR project_name ILIKE '%' || $2 || '%')
               AND ($3::TEXT IS NULL OR customer_name = $3)
               AND ($4::TEXT IS NULL OR project_manager = $4)
               AND ($5::TEXT IS NULL OR vendors = $5)
               AND ($6::TEXT IS NULL OR suppliers = $6)
               AND ($7::TEXT IS NULL OR am = $7)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(&filter.pr_number)
            .bind(&filter.project_name)
            .bind(&filter.customer_name)
            .bind(&filter.project_manager)
            .bind(&filter.vendors)
            .bind(&filter.suppliers)
            .bind(&filter.am)
            .fetch_all(pool)
            .await
    }

    /// Dropdown values for the filter form, read from the project and
    /// directory tables.
    pub async fn filter_options(pool: &PgPool) -> Result<ReportFilterOptions, sqlx::Error> {
        Ok(ReportFilterOptions {
            pr_numbers: ProjectRepo::pr_numbers(pool).await?,
            customers: DirectoryRepo::names(pool, DirectoryKind::Customer).await?,
            project_managers: DirectoryRepo::names(pool, DirectoryKind::ProjectManager).await?,
            account_managers: DirectoryRepo::names(pool, DirectoryKind::AccountManager).await?,
            vendors: DirectoryRepo::names(pool, DirectoryKind::Vendor).await?,
            suppliers: DirectoryRepo::names(pool, DirectoryKind::Supplier).await?,
        })
    }
}
