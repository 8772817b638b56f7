//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async operations that
//! accept `&PgPool` as the first argument. Writes touching more than one row
//! run in a single transaction.

pub mod category_repo;
pub mod directory_repo;
pub mod invoice_repo;
pub mod project_repo;
pub mod purchase_order_repo;
pub mod report_repo;

pub use category_repo::CategoryRepo;
pub use directory_repo::DirectoryRepo;
pub use invoice_repo::{InvoiceRepo, TxLedger};
pub use project_repo::ProjectRepo;
pub use purchase_order_repo::PurchaseOrderRepo;
pub use report_repo::ReportRepo;
