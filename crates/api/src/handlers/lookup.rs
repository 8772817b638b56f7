//! AJAX lookups behind the report filters: the projects linked to a named
//! customer, vendor, supplier, project manager or account manager.
//!
//! Every response uses the `{ "success": ..., ... }` envelope, including
//! failures (see [`LookupError`]).

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use opsboard_core::format::{format_amount, NOT_AVAILABLE};
use opsboard_core::types::{DbId, Money};
use opsboard_core::validation::MAX_TEXT_LEN;
use opsboard_db::models::directory::{DirectoryKind, NamedEntry};
use opsboard_db::models::project::ProjectSummary;
use opsboard_db::repositories::{DirectoryRepo, ProjectRepo};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::LookupError;
use crate::state::AppState;

type LookupResult<T> = Result<Json<T>, LookupError>;

/// Directory entry as shown in the lookup header.
#[derive(Debug, Serialize)]
pub struct EntryCard {
    pub id: DbId,
    pub name: String,
    pub abb: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerProject {
    pub id: DbId,
    pub pr_number: String,
    pub name: String,
    pub value: String,
    pub customer_po: Option<String>,
    pub deadline: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VendorProject {
    pub id: DbId,
    pub pr_number: String,
    pub name: String,
    pub customer_name: String,
    pub value: String,
    pub customer_po: Option<String>,
    pub deadline: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SupplierProject {
    pub id: DbId,
    pub pr_number: String,
    pub name: String,
    pub customer_name: String,
    pub value: String,
    pub customer_po: String,
    pub po_value: String,
    pub all_ds: String,
    pub deadline: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ManagedProject {
    pub id: DbId,
    pub pr_number: String,
    pub name: String,
    pub customer_name: String,
    pub value: String,
}

/// `{ success, customer, projects, total_projects, total_value }` and its
/// per-kind variants. `entry_key` names the header field.
#[derive(Debug, Serialize)]
pub struct LookupResponse<E: Serialize, P: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub entry: HashMap<&'static str, E>,
    pub projects: Vec<P>,
    pub total_projects: usize,
    pub total_value: Money,
}

impl<E: Serialize, P: Serialize> LookupResponse<E, P> {
    fn new(entry_key: &'static str, entry: E, projects: Vec<P>, total_value: Money) -> Self {
        Self {
            success: true,
            entry: HashMap::from([(entry_key, entry)]),
            total_projects: projects.len(),
            projects,
            total_value,
        }
    }
}

/// GET /api/v1/reports/customer-projects?customer_name=
pub async fn customer_projects(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> LookupResult<LookupResponse<EntryCard, CustomerProject>> {
    let kind = DirectoryKind::Customer;
    let name = name_param(&params, "customer_name")?;

    let customer = DirectoryRepo::find_customer_by_name(&state.pool, name)
        .await
        .map_err(|e| internal(kind, name, e))?
        .ok_or_else(|| not_found(kind, name))?;
    let projects = load_projects(&state, kind, customer.id, name).await?;
    let total = total_value(&projects);

    let card = EntryCard {
        id: customer.id,
        name: customer.name,
        abb: customer.abb.unwrap_or_else(|| NOT_AVAILABLE.into()),
        kind: customer.kind.unwrap_or_else(|| NOT_AVAILABLE.into()),
    };
    let rows = projects
        .into_iter()
        .map(|p| CustomerProject {
            id: p.id,
            deadline: deadline(&p),
            value: format_amount(p.value),
            pr_number: p.pr_number,
            name: p.name,
            customer_po: p.customer_po,
        })
        .collect();

    Ok(Json(LookupResponse::new("customer", card, rows, total)))
}

/// GET /api/v1/reports/vendor-projects?vendor_name=
pub async fn vendor_projects(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> LookupResult<LookupResponse<EntryCard, VendorProject>> {
    let kind = DirectoryKind::Vendor;
    let name = name_param(&params, "vendor_name")?;
    let vendor = find_entry(&state, kind, name).await?;
    let projects = load_projects(&state, kind, vendor.id, name).await?;
    let total = total_value(&projects);

    let rows = projects
        .into_iter()
        .map(|p| VendorProject {
            id: p.id,
            deadline: deadline(&p),
            value: format_amount(p.value),
            customer_name: p.customer_name.unwrap_or_else(|| NOT_AVAILABLE.into()),
            pr_number: p.pr_number,
            name: p.name,
            customer_po: p.customer_po,
        })
        .collect();

    Ok(Json(LookupResponse::new(
        "vendor",
        card(vendor, kind),
        rows,
        total,
    )))
}

/// GET /api/v1/reports/supplier-projects?supplier_name=
pub async fn supplier_projects(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> LookupResult<LookupResponse<EntryCard, SupplierProject>> {
    let kind = DirectoryKind::Supplier;
    let name = name_param(&params, "supplier_name")?;
    let supplier = find_entry(&state, kind, name).await?;
    let projects = load_projects(&state, kind, supplier.id, name).await?;
    let total = total_value(&projects);

    let rows = projects
        .into_iter()
        .map(|p| SupplierProject {
            id: p.id,
            deadline: deadline(&p),
            value: format_amount(p.value),
            po_value: format_amount(p.value),
            customer_name: p.customer_name.unwrap_or_else(|| NOT_AVAILABLE.into()),
            customer_po: p.customer_po.unwrap_or_else(|| NOT_AVAILABLE.into()),
            all_ds: p.supplier_names.unwrap_or_default(),
            pr_number: p.pr_number,
            name: p.name,
        })
        .collect();

    Ok(Json(LookupResponse::new(
        "supplier",
        card(supplier, kind),
        rows,
        total,
    )))
}

/// GET /api/v1/reports/pm-projects?pm_name=
pub async fn pm_projects(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> LookupResult<LookupResponse<NamedEntry, ManagedProject>> {
    managed_projects(&state, DirectoryKind::ProjectManager, &params, "pm_name", "pm").await
}

/// GET /api/v1/reports/am-projects?am_name=
pub async fn am_projects(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> LookupResult<LookupResponse<NamedEntry, ManagedProject>> {
    managed_projects(&state, DirectoryKind::AccountManager, &params, "am_name", "am").await
}

async fn managed_projects(
    state: &AppState,
    kind: DirectoryKind,
    params: &HashMap<String, String>,
    param: &str,
    entry_key: &'static str,
) -> LookupResult<LookupResponse<NamedEntry, ManagedProject>> {
    let name = name_param(params, param)?;
    let manager = find_entry(state, kind, name).await?;
    let projects = load_projects(state, kind, manager.id, name).await?;
    let total = total_value(&projects);

    let rows = projects
        .into_iter()
        .map(|p| ManagedProject {
            id: p.id,
            value: format_amount(p.value),
            customer_name: p.customer_name.unwrap_or_else(|| NOT_AVAILABLE.into()),
            pr_number: p.pr_number,
            name: p.name,
        })
        .collect();

    Ok(Json(LookupResponse::new(entry_key, manager, rows, total)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Required, trimmed name parameter of at most [`MAX_TEXT_LEN`] characters.
fn name_param<'a>(params: &'a HashMap<String, String>, key: &str) -> Result<&'a str, LookupError> {
    let label = key.replace('_', " ");
    let value = params.get(key).map(|v| v.trim()).unwrap_or_default();
    if value.is_empty() {
        return Err(LookupError::Invalid(format!(
            "Validation failed: The {label} field is required."
        )));
    }
    if value.chars().count() as u64 > MAX_TEXT_LEN {
        return Err(LookupError::Invalid(format!(
            "Validation failed: The {label} may not be greater than {MAX_TEXT_LEN} characters."
        )));
    }
    Ok(value)
}

async fn find_entry(
    state: &AppState,
    kind: DirectoryKind,
    name: &str,
) -> Result<NamedEntry, LookupError> {
    DirectoryRepo::find_by_name(&state.pool, kind, name)
        .await
        .map_err(|e| internal(kind, name, e))?
        .ok_or_else(|| not_found(kind, name))
}

async fn load_projects(
    state: &AppState,
    kind: DirectoryKind,
    entry_id: DbId,
    name: &str,
) -> Result<Vec<ProjectSummary>, LookupError> {
    ProjectRepo::list_for_directory(&state.pool, kind, entry_id)
        .await
        .map_err(|e| internal(kind, name, e))
}

fn card(entry: NamedEntry, kind: DirectoryKind) -> EntryCard {
    EntryCard {
        id: entry.id,
        name: entry.name,
        abb: NOT_AVAILABLE.into(),
        kind: kind.label().into(),
    }
}

fn total_value(projects: &[ProjectSummary]) -> Money {
    projects.iter().map(|p| p.value).sum::<Decimal>()
}

fn deadline(project: &ProjectSummary) -> Option<String> {
    project
        .customer_po_deadline
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn not_found(kind: DirectoryKind, name: &str) -> LookupError {
    LookupError::NotFound(format!("{} not found: {name}", kind.label()))
}

fn internal(kind: DirectoryKind, name: &str, err: sqlx::Error) -> LookupError {
    tracing::error!(kind = kind.label(), name, error = %err, "Project lookup failed");
    LookupError::Internal(format!(
        "An error occurred while fetching {} projects. Please try again.",
        message_subject(kind)
    ))
}

/// Subject of the generic failure message: "customer projects", "PM projects".
fn message_subject(kind: DirectoryKind) -> &'static str {
    match kind {
        DirectoryKind::Customer => "customer",
        DirectoryKind::Vendor => "vendor",
        DirectoryKind::Supplier => "supplier",
        DirectoryKind::ProjectManager => "PM",
        DirectoryKind::AccountManager => "AM",
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn missing_name_is_a_validation_failure() {
        let params = HashMap::from([("customer_name".to_string(), "  ".to_string())]);
        assert_matches!(
            name_param(&params, "customer_name"),
            Err(LookupError::Invalid(msg)) if msg == "Validation failed: The customer name field is required."
        );
        assert_matches!(name_param(&HashMap::new(), "pm_name"), Err(LookupError::Invalid(_)));
    }

    #[test]
    fn overlong_name_is_rejected() {
        let params = HashMap::from([("am_name".to_string(), "x".repeat(256))]);
        assert_matches!(name_param(&params, "am_name"), Err(LookupError::Invalid(_)));
    }

    #[test]
    fn name_is_trimmed() {
        let params = HashMap::from([("vendor_name".to_string(), " Cisco ".to_string())]);
        assert_eq!(name_param(&params, "vendor_name").unwrap(), "Cisco");
    }

    #[test]
    fn failure_messages_name_the_kind() {
        assert_eq!(
            not_found(DirectoryKind::ProjectManager, "Omar").to_string(),
            "PM not found: Omar"
        );
        assert_eq!(
            internal(DirectoryKind::Customer, "Acme", sqlx::Error::PoolTimedOut).to_string(),
            "An error occurred while fetching customer projects. Please try again."
        );
    }
}
