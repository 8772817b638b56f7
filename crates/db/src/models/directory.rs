//! Directory tables: customers, vendors, suppliers and managers.

use opsboard_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The kinds of directory entry a project can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    Customer,
    Vendor,
    Supplier,
    ProjectManager,
    AccountManager,
}

impl DirectoryKind {
    pub fn table(self) -> &'static str {
        match self {
            DirectoryKind::Customer => "customers",
            DirectoryKind::Vendor => "vendors",
            DirectoryKind::Supplier => "suppliers",
            DirectoryKind::ProjectManager => "project_managers",
            DirectoryKind::AccountManager => "account_managers",
        }
    }

    /// Human-readable label used in messages ("Customer not found: ...").
    pub fn label(self) -> &'static str {
        match self {
            DirectoryKind::Customer => "Customer",
            DirectoryKind::Vendor => "Vendor",
            DirectoryKind::Supplier => "Supplier",
            DirectoryKind::ProjectManager => "PM",
            DirectoryKind::AccountManager => "AM",
        }
    }

    /// SQL predicate on `projects p` selecting the projects linked to entry `$1`.
    pub(crate) fn project_predicate(self) -> &'static str {
        match self {
            DirectoryKind::Customer => "p.customer_id = $1",
            DirectoryKind::Vendor => "p.vendor_id = $1",
            DirectoryKind::Supplier => {
                "EXISTS (SELECT 1 FROM project_suppliers ps \
                 WHERE ps.project_id = p.id AND ps.supplier_id = $1)"
            }
            DirectoryKind::ProjectManager => "p.pm_id = $1",
            DirectoryKind::AccountManager => "p.am_id = $1",
        }
    }
}

/// An `(id, name)` directory entry.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct NamedEntry {
    pub id: DbId,
    pub name: String,
}

/// A row from the `customers` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: DbId,
    pub name: String,
    /// Abbreviation.
    pub abb: Option<String>,
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplier_lookup_goes_through_pivot() {
        assert!(DirectoryKind::Supplier
            .project_predicate()
            .contains("project_suppliers"));
        assert_eq!(DirectoryKind::AccountManager.table(), "account_managers");
        assert_eq!(DirectoryKind::ProjectManager.label(), "PM");
    }
}
