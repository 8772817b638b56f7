//! Read access to the directory tables (customers, vendors, suppliers,
//! project and account managers).

use opsboard_core::types::DbId;
use sqlx::PgPool;

use crate::models::directory::{Customer, DirectoryKind, NamedEntry};

pub struct DirectoryRepo;

impl DirectoryRepo {
    /// Insert an `(id, name)` entry. Customers get no abbreviation or kind.
    pub async fn create(
        pool: &PgPool,
        kind: DirectoryKind,
        name: &str,
    ) -> Result<NamedEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} (name) VALUES ($1) RETURNING id, name",
            kind.table()
        );
        sqlx::query_as::<_, NamedEntry>(&query)
            .bind(name)
            .fetch_one(pool)
            .await
    }

    pub async fn create_customer(
        pool: &PgPool,
        name: &str,
        abb: Option<&str>,
        kind: Option<&str>,
    ) -> Result<Customer, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (name, abb, kind) VALUES ($1, $2, $3)
             RETURNING id, name, abb, kind",
        )
        .bind(name)
        .bind(abb)
        .bind(kind)
        .fetch_one(pool)
        .await
    }

    /// All entries of one kind, ordered by name.
    pub async fn list(pool: &PgPool, kind: DirectoryKind) -> Result<Vec<NamedEntry>, sqlx::Error> {
        let query = format!("SELECT id, name FROM {} ORDER BY name", kind.table());
        sqlx::query_as::<_, NamedEntry>(&query).fetch_all(pool).await
    }

    /// Names of all entries of one kind, ordered.
    pub async fn names(pool: &PgPool, kind: DirectoryKind) -> Result<Vec<String>, sqlx::Error> {
        let query = format!("SELECT name FROM {} ORDER BY name", kind.table());
        sqlx::query_scalar::<_, String>(&query).fetch_all(pool).await
    }

    /// Exact-name lookup.
    pub async fn find_by_name(
        pool: &PgPool,
        kind: DirectoryKind,
        name: &str,
    ) -> Result<Option<NamedEntry>, sqlx::Error> {
        let query = format!("SELECT id, name FROM {} WHERE name = $1", kind.table());
        sqlx::query_as::<_, NamedEntry>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_customer_by_name(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<Customer>, sqlx::Error> {
        sqlx::query_as::<_, Customer>("SELECT id, name, abb, kind FROM customers WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, kind: DirectoryKind, id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", kind.table());
        sqlx::query_scalar::<_, bool>(&query)
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
