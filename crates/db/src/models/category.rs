//! Purchase order categories.

use opsboard_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Category dropdown entry. `project_id` is `None` for shared categories.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CategoryOption {
    pub id: DbId,
    pub project_id: Option<DbId>,
    pub name: String,
}
