//! Purchase order (PPO) entity model and DTOs.

use chrono::NaiveDate;
use opsboard_core::types::{DbId, Money, Timestamp};
use opsboard_core::validation::non_negative;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::category::CategoryOption;
use crate::models::directory::NamedEntry;
use crate::models::project::ProjectOption;

/// A row from the `purchase_orders` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: DbId,
    pub project_id: DbId,
    pub category_id: DbId,
    pub supplier_id: DbId,
    pub po_number: String,
    pub value: Option<Money>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub updates: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Purchase order joined with its project, category and supplier names.
///
/// `all_categories` lists every category sharing the row's PO number.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PurchaseOrderDetail {
    pub id: DbId,
    pub project_id: DbId,
    pub category_id: DbId,
    pub supplier_id: DbId,
    pub po_number: String,
    pub value: Option<Money>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub updates: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub pr_number: Option<String>,
    pub project_name: Option<String>,
    pub category_name: Option<String>,
    pub supplier_name: Option<String>,
    pub all_categories: Option<String>,
}

/// Validated fields of a purchase order submission.
///
/// `category_ids` fans out into one row per distinct category.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PurchaseOrderInput {
    pub project_id: DbId,
    #[serde(default)]
    pub category_ids: Vec<DbId>,
    pub supplier_id: DbId,
    #[validate(length(min = 1, max = 255))]
    pub po_number: String,
    #[validate(custom(function = "non_negative"))]
    pub value: Option<Money>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub updates: Option<String>,
    pub notes: Option<String>,
}

/// Result of a fan-out write that claims a PO number.
#[derive(Debug, Clone)]
pub enum FanOutWrite<T> {
    Written(T),
    /// Another group holds the PO number; nothing was written.
    NumberTaken,
}

/// Outcome of editing one row of a fan-out group.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderUpdate {
    /// The edited row.
    pub updated: PurchaseOrder,
    /// Rows inserted for the additional categories.
    pub created: Vec<PurchaseOrder>,
    /// Sibling rows whose category was dropped from the submission. They are
    /// kept as they were.
    pub stale: Vec<PurchaseOrder>,
}

/// Dropdown data for the purchase order form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderFormOptions {
    pub projects: Vec<ProjectOption>,
    pub categories: Vec<CategoryOption>,
    pub suppliers: Vec<NamedEntry>,
}
