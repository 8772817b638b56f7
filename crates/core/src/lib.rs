//! Domain rules for the operations dashboard.
//!
//! Everything here is storage-agnostic: the database and HTTP crates plug
//! into the seams defined in [`invoice_totals`] and [`cache`].

pub mod cache;
pub mod error;
pub mod export;
pub mod format;
pub mod invoice_totals;
pub mod purchase_order;
pub mod types;
pub mod upload;
pub mod validation;
