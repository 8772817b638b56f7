//! Row structs and input DTOs.
//!
//! Each submodule contains:
//! - `FromRow` + `Serialize` row structs (also `Deserialize`, so listings can
//!   round-trip through the result cache)
//! - `Deserialize` + `Validate` input DTOs

pub mod category;
pub mod directory;
pub mod invoice;
pub mod project;
pub mod purchase_order;
pub mod report;
