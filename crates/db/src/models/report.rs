//! Report rows, filters and CSV mapping.

use chrono::NaiveDate;
use opsboard_core::export::csv::CsvRecord;
use opsboard_core::format::{format_optional_amount, format_optional_date};
use opsboard_core::types::{DbId, Money, Timestamp};
use opsboard_core::validation::{non_negative, percentage};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Report {
    pub id: DbId,
    pub pr_number: Option<String>,
    pub project_name: Option<String>,
    pub project_manager: Option<String>,
    pub technologies: Option<String>,
    pub customer_name: Option<String>,
    pub customer_po: Option<String>,
    pub value: Option<Money>,
    pub invoice_total: Option<Money>,
    pub customer_po_deadline: Option<NaiveDate>,
    pub actual_completion_percentage: Option<Money>,
    pub vendors: Option<String>,
    pub suppliers: Option<String>,
    pub am: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Report {
    /// The row as exported to CSV, in column order.
    pub fn csv_record(&self) -> CsvRecord {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let mut record = CsvRecord::new();
        record.insert("PR Number".into(), text(&self.pr_number));
        record.insert("Project Name".into(), text(&self.project_name));
        record.insert("Project Manager".into(), text(&self.project_manager));
        record.insert("Technologies".into(), text(&self.technologies));
        record.insert("Customer Name".into(), text(&self.customer_name));
        record.insert("Customer PO".into(), text(&self.customer_po));
        record.insert("Value".into(), format_optional_amount(self.value));
        record.insert(
            "Invoice Total".into(),
            format_optional_amount(self.invoice_total),
        );
        record.insert(
            "Customer PO Deadline".into(),
            format_optional_date(self.customer_po_deadline),
        );
        record.insert(
            "Completion %".into(),
            self.actual_completion_percentage
                .map(|p| p.normalize().to_string())
                .unwrap_or_default(),
        );
        record.insert("Vendors".into(), text(&self.vendors));
        record.insert("Suppliers".into(), text(&self.suppliers));
        record.insert("AM".into(), text(&self.am));
        record
    }
}

/// DTO for creating or replacing a report. Every field is optional; absent
/// fields are stored as NULL.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReportInput {
    #[validate(length(max = 255))]
    pub pr_number: Option<String>,
    #[validate(length(max = 255))]
    pub project_name: Option<String>,
    #[validate(length(max = 255))]
    pub project_manager: Option<String>,
    pub technologies: Option<String>,
    #[validate(length(max = 255))]
    pub customer_name: Option<String>,
    #[validate(length(max = 255))]
    pub customer_po: Option<String>,
    #[validate(custom(function = "non_negative"))]
    pub value: Option<Money>,
    #[validate(custom(function = "non_negative"))]
    pub invoice_total: Option<Money>,
    pub customer_po_deadline: Option<NaiveDate>,
    #[validate(custom(function = "percentage"))]
    pub actual_completion_percentage: Option<Money>,
    #[validate(length(max = 255))]
    pub vendors: Option<String>,
    #[validate(length(max = 255))]
    pub suppliers: Option<String>,
    #[validate(length(max = 255))]
    pub am: Option<String>,
}

/// Report list filters. `pr_number` and `project_name` match partially and
/// case-insensitively; the name filters match exactly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFilter {
    pub pr_number: Option<String>,
    pub project_name: Option<String>,
    pub customer_name: Option<String>,
    pub project_manager: Option<String>,
    pub vendors: Option<String>,
    pub suppliers: Option<String>,
    pub am: Option<String>,
}

impl ReportFilter {
    /// Blank filter values are treated as absent.
    pub fn normalized(&self) -> Self {
        let clean = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            pr_number: clean(&self.pr_number),
            project_name: clean(&self.project_name),
            customer_name: clean(&self.customer_name),
            project_manager: clean(&self.project_manager),
            vendors: clean(&self.vendors),
            suppliers: clean(&self.suppliers),
            am: clean(&self.am),
        }
    }
}

/// Dropdown values for the report filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilterOptions {
    pub pr_numbers: Vec<String>,
    pub customers: Vec<String>,
    pub project_managers: Vec<String>,
    pub account_managers: Vec<String>,
    pub vendors: Vec<String>,
    pub suppliers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    fn report() -> Report {
        Report {
            id: 1,
            pr_number: Some("PR-100".into()),
            project_name: Some("Tower, Phase 2".into()),
            project_manager: None,
            technologies: None,
            customer_name: Some("Acme".into()),
            customer_po: None,
            value: Some(Decimal::new(1_234_500, 2)),
            invoice_total: None,
            customer_po_deadline: NaiveDate::from_ymd_opt(2025, 3, 9),
            actual_completion_percentage: Some(Decimal::new(7550, 2)),
            vendors: None,
            suppliers: None,
            am: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn csv_record_has_fixed_column_order() {
        let record = report().csv_record();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys.first(), Some(&"PR Number"));
        assert_eq!(keys.last(), Some(&"AM"));
        assert_eq!(keys.len(), 13);
        assert_eq!(record["Value"], "12,345.00");
        assert_eq!(record["Completion %"], "75.5");
        assert_eq!(record["Customer PO Deadline"], "2025-03-09");
        assert_eq!(record["Invoice Total"], "N/A");
    }

    #[test]
    fn blank_filters_are_dropped() {
        let filter = ReportFilter {
            pr_number: Some("  ".into()),
            am: Some(" Sara ".into()),
            ..Default::default()
        }
        .normalized();
        assert!(filter.pr_number.is_none());
        assert_eq!(filter.am.as_deref(), Some("Sara"));
    }
}
