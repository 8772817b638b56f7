//! Repository for the `categories` table.

use opsboard_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::CategoryOption;

const COLUMNS: &str = "id, project_id, name";

pub struct CategoryRepo;

impl CategoryRepo {
    pub async fn create(
        pool: &PgPool,
        project_id: Option<DbId>,
        name: &str,
    ) -> Result<CategoryOption, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (project_id, name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CategoryOption>(&query)
            .bind(project_id)
            .bind(name)
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<CategoryOption>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories ORDER BY name, id");
        sqlx::query_as::<_, CategoryOption>(&query)
            .fetch_all(pool)
            .await
    }

    /// Categories defined for one project.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<CategoryOption>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM categories WHERE project_id = $1 ORDER BY name, id");
        sqlx::query_as::<_, CategoryOption>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// The subset of `ids` that does not name an existing category.
    pub async fn missing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT wanted.id
             FROM UNNEST($1::BIGINT[]) AS wanted(id)
             WHERE NOT EXISTS (SELECT 1 FROM categories c WHERE c.id = wanted.id)
             ORDER BY wanted.id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }
}
