//! Invoice entity model and DTOs.

use opsboard_core::invoice_totals::ProjectTotal;
use opsboard_core::types::{DbId, Money, Timestamp};
use opsboard_core::validation::non_negative;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `invoices` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Invoice {
    pub id: DbId,
    pub invoice_number: String,
    pub project_id: DbId,
    pub value: Money,
    /// Sum of `value` over all invoices of `project_id`.
    pub project_total: Money,
    pub status: String,
    /// Stored file name inside the upload directory.
    pub attachment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Invoice joined with the project it bills.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvoiceWithProject {
    pub id: DbId,
    pub invoice_number: String,
    pub project_id: DbId,
    pub value: Money,
    pub project_total: Money,
    pub status: String,
    pub attachment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub pr_number: Option<String>,
    pub project_name: Option<String>,
    pub project_value: Option<Money>,
}

/// Validated fields of an invoice form submission.
///
/// The attachment travels separately because it is stored on disk before
/// the row is written.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InvoiceInput {
    #[validate(length(min = 1, max = 255))]
    pub invoice_number: String,
    #[validate(custom(function = "non_negative"))]
    pub value: Money,
    pub project_id: DbId,
    #[validate(length(min = 1, max = 255))]
    pub status: String,
}

/// Outcome of an invoice insert or update.
#[derive(Debug, Clone)]
pub struct InvoiceChange {
    pub invoice: Invoice,
    /// Recomputed aggregate per affected project group.
    pub totals: Vec<ProjectTotal>,
    /// Attachment the write replaced; the caller removes the file.
    pub replaced_attachment: Option<String>,
}

/// Outcome of an invoice delete.
#[derive(Debug, Clone)]
pub struct InvoiceRemoval {
    /// The row as it was before deletion.
    pub invoice: Invoice,
    pub totals: Vec<ProjectTotal>,
}
