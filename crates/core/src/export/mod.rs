//! Tabular exports: CSV, landscape PDF and auto-printing HTML.
//!
//! PDF and print views render the same [`TableDocument`]; the column sets for
//! invoices and purchase orders are fixed here.

pub mod csv;
pub mod html;
pub mod pdf;

/// Horizontal alignment of a cell's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One fixed column of an exported table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub label: &'static str,
    /// Width in millimetres on a landscape A4 page.
    pub width_mm: f64,
    pub align: Align,
}

const fn col(label: &'static str, width_mm: f64, align: Align) -> Column {
    Column {
        label,
        width_mm,
        align,
    }
}

/// Invoice export columns (277 mm total).
pub const INVOICE_COLUMNS: &[Column] = &[
    col("#", 10.0, Align::Center),
    col("PR Number", 30.0, Align::Left),
    col("Project Name", 50.0, Align::Left),
    col("Invoice Number", 35.0, Align::Left),
    col("Value", 35.0, Align::Right),
    col("PR Total Value", 40.0, Align::Right),
    col("Project Value", 40.0, Align::Right),
    col("Status", 37.0, Align::Center),
];

/// Purchase order export columns (277 mm total).
pub const PURCHASE_ORDER_COLUMNS: &[Column] = &[
    col("#", 10.0, Align::Center),
    col("PR Number", 25.0, Align::Left),
    col("Project Name", 45.0, Align::Left),
    col("Category", 30.0, Align::Left),
    col("Supplier", 30.0, Align::Left),
    col("PO Number", 27.0, Align::Left),
    col("Value", 25.0, Align::Right),
    col("Date", 25.0, Align::Center),
    col("Status", 30.0, Align::Left),
    col("Updates", 30.0, Align::Left),
];

/// A titled table ready to be rendered.
#[derive(Debug, Clone)]
pub struct TableDocument {
    /// System name printed above the title.
    pub brand: String,
    pub title: String,
    /// Pre-formatted generation timestamp.
    pub generated: String,
    pub columns: &'static [Column],
    /// Cell text per row; each row has one entry per column.
    pub rows: Vec<Vec<String>>,
}

impl TableDocument {
    pub fn new(
        brand: impl Into<String>,
        title: impl Into<String>,
        generated: impl Into<String>,
        columns: &'static [Column],
    ) -> Self {
        Self {
            brand: brand.into(),
            title: title.into(),
            generated: generated.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.columns.len(), String::new());
        self.rows.push(cells);
    }
}
