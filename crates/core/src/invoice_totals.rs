//! Per-project invoice total aggregation.
//!
//! Every invoice carries a denormalized `project_total`: the sum of `value`
//! over all invoices of the same project. After any invoice write the total
//! is recomputed for each affected project group and written back onto
//! every row of that group.
//!
//! Storage is abstracted behind [`InvoiceLedger`]. Callers lock the groups
//! in [`TotalsScope`] order *before* mutating the invoice, then call
//! [`recompute_totals`] inside the same transaction, so two writers to one
//! project serialize instead of racing on the read-sum-then-write.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::DbId;

/// Aggregate reported for a project that has no invoices left.
pub const EMPTY_GROUP_TOTAL: Decimal = Decimal::ZERO;

/// The project groups touched by one invoice write.
///
/// Ids are kept ascending and unique; that order is also the lock order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalsScope {
    projects: Vec<DbId>,
}

impl TotalsScope {
    /// A new invoice only affects its own project.
    pub fn created(project_id: DbId) -> Self {
        Self {
            projects: vec![project_id],
        }
    }

    /// An update affects the new group and, when the invoice moved, the old one.
    pub fn updated(old_project_id: DbId, new_project_id: DbId) -> Self {
        let mut projects = vec![old_project_id, new_project_id];
        projects.sort_unstable();
        projects.dedup();
        Self { projects }
    }

    /// A delete affects the group the invoice was removed from.
    pub fn deleted(project_id: DbId) -> Self {
        Self::created(project_id)
    }

    pub fn projects(&self) -> &[DbId] {
        &self.projects
    }

    /// Whether the write moved an invoice between two projects.
    pub fn is_move(&self) -> bool {
        self.projects.len() > 1
    }
}

/// The recomputed aggregate of one project group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectTotal {
    pub project_id: DbId,
    pub total: Decimal,
    /// Number of invoice rows that received the new total.
    pub rows_updated: u64,
}

/// Persistence operations the aggregator needs.
///
/// Implementations run against one open transaction.
#[async_trait]
pub trait InvoiceLedger: Send {
    type Error: Send;

    /// Take an exclusive lock on the given project groups, in slice order.
    async fn lock_projects(&mut self, project_ids: &[DbId]) -> Result<(), Self::Error>;

    /// Sum of `value` over all invoices of the project (0 when none).
    async fn sum_values(&mut self, project_id: DbId) -> Result<Decimal, Self::Error>;

    /// Set `project_total` on every invoice of the project, returning the
    /// number of rows written.
    async fn write_total(&mut self, project_id: DbId, total: Decimal)
        -> Result<u64, Self::Error>;
}

/// Lock every group in `scope`. Must run before the invoice row is written.
pub async fn lock_scope<L>(ledger: &mut L, scope: &TotalsScope) -> Result<(), L::Error>
where
    L: InvoiceLedger + ?Sized,
{
    ledger.lock_projects(scope.projects()).await
}

/// Recompute and write back the aggregate of every group in `scope`.
pub async fn recompute_totals<L>(
    ledger: &mut L,
    scope: &TotalsScope,
) -> Result<Vec<ProjectTotal>, L::Error>
where
    L: InvoiceLedger + ?Sized,
{
    let mut totals = Vec::with_capacity(scope.projects().len());
    for &project_id in scope.projects() {
        let total = ledger.sum_values(project_id).await?;
        let rows_updated = ledger.write_total(project_id, total).await?;
        let total = if rows_updated == 0 {
            EMPTY_GROUP_TOTAL
        } else {
            total
        };
        totals.push(ProjectTotal {
            project_id,
            total,
            rows_updated,
        });
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    #[derive(Debug, Clone)]
    struct Row {
        id: DbId,
        project_id: DbId,
        value: Decimal,
        project_total: Decimal,
    }

    #[derive(Default)]
    struct MemoryLedger {
        rows: Vec<Row>,
        locked: Vec<DbId>,
    }

    impl MemoryLedger {
        fn insert(&mut self, id: DbId, project_id: DbId, cents: i64) {
            self.rows.push(Row {
                id,
                project_id,
                value: Decimal::new(cents, 2),
                project_total: Decimal::ZERO,
            });
        }

        fn assert_invariant(&self) {
            for row in &self.rows {
                let expected: Decimal = self
                    .rows
                    .iter()
                    .filter(|r| r.project_id == row.project_id)
                    .map(|r| r.value)
                    .sum();
                assert_eq!(row.project_total, expected, "invoice {}", row.id);
            }
        }
    }

    #[async_trait]
    impl InvoiceLedger for MemoryLedger {
        type Error = Infallible;

        async fn lock_projects(&mut self, project_ids: &[DbId]) -> Result<(), Infallible> {
            self.locked.extend_from_slice(project_ids);
            Ok(())
        }

        async fn sum_values(&mut self, project_id: DbId) -> Result<Decimal, Infallible> {
            Ok(self
                .rows
                .iter()
                .filter(|r| r.project_id == project_id)
                .map(|r| r.value)
                .sum())
        }

        async fn write_total(&mut self, project_id: DbId, total: Decimal) -> Result<u64, Infallible> {
            let mut n = 0;
            for row in self.rows.iter_mut().filter(|r| r.project_id == project_id) {
                row.project_total = total;
                n += 1;
            }
            Ok(n)
        }
    }

    #[test]
    fn scope_orders_and_dedups_projects() {
        assert_eq!(TotalsScope::updated(9, 3).projects(), &[3, 9]);
        assert_eq!(TotalsScope::updated(4, 4).projects(), &[4]);
        assert!(TotalsScope::updated(9, 3).is_move());
        assert!(!TotalsScope::created(1).is_move());
    }

    #[tokio::test]
    async fn lock_scope_locks_in_ascending_order() {
        let mut ledger = MemoryLedger::default();
        lock_scope(&mut ledger, &TotalsScope::updated(42, 7))
            .await
            .unwrap();
        assert_eq!(ledger.locked, vec![7, 42]);
    }

    #[tokio::test]
    async fn create_sets_total_on_every_sibling() {
        let mut ledger = MemoryLedger::default();
        ledger.insert(1, 10, 100_00);
        ledger.insert(2, 10, 50_25);
        ledger.insert(3, 20, 7_00);

        let totals = recompute_totals(&mut ledger, &TotalsScope::created(10))
            .await
            .unwrap();

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total, Decimal::new(150_25, 2));
        assert_eq!(totals[0].rows_updated, 2);
        assert_eq!(ledger.rows[0].project_total, Decimal::new(150_25, 2));
        assert_eq!(ledger.rows[1].project_total, Decimal::new(150_25, 2));
        // Untouched group keeps its stale value until it is in scope.
        assert_eq!(ledger.rows[2].project_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn move_recomputes_both_groups() {
        let mut ledger = MemoryLedger::default();
        ledger.insert(1, 10, 100_00);
        ledger.insert(2, 10, 40_00);
        ledger.insert(3, 20, 5_00);
        recompute_totals(&mut ledger, &TotalsScope::updated(10, 20))
            .await
            .unwrap();
        ledger.assert_invariant();

        // Move invoice 2 from project 10 to 20.
        ledger.rows[1].project_id = 20;
        let scope = TotalsScope::updated(10, 20);
        let totals = recompute_totals(&mut ledger, &scope).await.unwrap();

        ledger.assert_invariant();
        assert_eq!(totals[0].project_id, 10);
        assert_eq!(totals[0].total, Decimal::new(100_00, 2));
        assert_eq!(totals[1].project_id, 20);
        assert_eq!(totals[1].total, Decimal::new(45_00, 2));
    }

    #[tokio::test]
    async fn deleting_last_invoice_reports_empty_total() {
        let mut ledger = MemoryLedger::default();
        ledger.insert(1, 10, 12_00);
        ledger.rows.clear();

        let totals = recompute_totals(&mut ledger, &TotalsScope::deleted(10))
            .await
            .unwrap();

        assert_eq!(totals[0].total, EMPTY_GROUP_TOTAL);
        assert_eq!(totals[0].rows_updated, 0);
    }

    #[tokio::test]
    async fn invariant_holds_after_sequence_of_writes() {
        let mut ledger = MemoryLedger::default();
        let writes: [(DbId, DbId, i64); 6] = [
            (1, 1, 10_00),
            (2, 1, 0),
            (3, 2, 99_99),
            (4, 1, 1_01),
            (5, 3, 500_00),
            (6, 2, 0_01),
        ];
        for (id, project, cents) in writes {
            ledger.insert(id, project, cents);
            recompute_totals(&mut ledger, &TotalsScope::created(project))
                .await
                .unwrap();
        }
        ledger.assert_invariant();

        ledger.rows.retain(|r| r.id != 3);
        recompute_totals(&mut ledger, &TotalsScope::deleted(2))
            .await
            .unwrap();
        ledger.assert_invariant();
    }
}
