//! Project entity model and DTOs.

use chrono::NaiveDate;
use opsboard_core::types::{DbId, Money, Timestamp};
use opsboard_core::validation::non_negative;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: DbId,
    pub pr_number: String,
    pub name: String,
    /// Nominal contract value. Not reconciled against invoice totals.
    pub value: Money,
    pub customer_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub pm_id: Option<DbId>,
    pub am_id: Option<DbId>,
    pub customer_po: Option<String>,
    pub customer_po_deadline: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Dropdown entry used by the invoice and purchase order forms.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ProjectOption {
    pub id: DbId,
    pub pr_number: String,
    pub name: String,
}

/// Project row as returned by the directory lookups, with the customer name
/// and the comma-joined names of its suppliers.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectSummary {
    pub id: DbId,
    pub pr_number: String,
    pub name: String,
    pub value: Money,
    pub customer_po: Option<String>,
    pub customer_po_deadline: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub supplier_names: Option<String>,
}

/// DTO for creating a project.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 255))]
    pub pr_number: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "non_negative"))]
    pub value: Money,
    pub customer_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub pm_id: Option<DbId>,
    pub am_id: Option<DbId>,
    #[validate(length(max = 255))]
    pub customer_po: Option<String>,
    pub customer_po_deadline: Option<NaiveDate>,
    /// Suppliers assigned to the project.
    #[serde(default)]
    pub supplier_ids: Vec<DbId>,
}

/// DTO for updating a project. All fields are optional; `supplier_ids`
/// replaces the whole assignment when present.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProject {
    #[validate(length(min = 1, max = 255))]
    pub pr_number: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(custom(function = "non_negative"))]
    pub value: Option<Money>,
    pub customer_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub pm_id: Option<DbId>,
    pub am_id: Option<DbId>,
    #[validate(length(max = 255))]
    pub customer_po: Option<String>,
    pub customer_po_deadline: Option<NaiveDate>,
    pub supplier_ids: Option<Vec<DbId>>,
}
