//! Table documents for invoice and purchase order exports, and the HTTP
//! responses that carry rendered PDF, HTML and CSV bodies.

use axum::body::Body;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Local};
use opsboard_core::export::{TableDocument, INVOICE_COLUMNS, PURCHASE_ORDER_COLUMNS};
use opsboard_core::format::{
    format_amount, format_optional_date, generated_stamp, or_not_available, NOT_AVAILABLE,
};
use opsboard_db::models::invoice::InvoiceWithProject;
use opsboard_db::models::purchase_order::PurchaseOrderDetail;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

pub const INVOICES_TITLE: &str = "Invoices Management";
pub const PURCHASE_ORDERS_TITLE: &str = "Project Purchase Orders Management";

/// Invoice table: amounts in SAR, project value 0 when the project is gone.
pub fn invoice_document(
    brand: &str,
    invoices: &[InvoiceWithProject],
    now: &DateTime<Local>,
) -> TableDocument {
    let mut doc = TableDocument::new(brand, INVOICES_TITLE, generated_stamp(now), INVOICE_COLUMNS);
    for (index, invoice) in invoices.iter().enumerate() {
        doc.push_row(vec![
            (index + 1).to_string(),
            or_not_available(invoice.pr_number.as_deref()),
            or_not_available(invoice.project_name.as_deref()),
            invoice.invoice_number.clone(),
            format!("{} SAR", format_amount(invoice.value)),
            format_amount(invoice.project_total),
            format_amount(invoice.project_value.unwrap_or(Decimal::ZERO)),
            invoice.status.clone(),
        ]);
    }
    doc
}

/// Purchase order table. The category cell lists every category sharing
/// the row's PO number.
pub fn purchase_order_document(
    brand: &str,
    orders: &[PurchaseOrderDetail],
    now: &DateTime<Local>,
) -> TableDocument {
    let mut doc = TableDocument::new(
        brand,
        PURCHASE_ORDERS_TITLE,
        generated_stamp(now),
        PURCHASE_ORDER_COLUMNS,
    );
    for (index, order) in orders.iter().enumerate() {
        let value = match order.value {
            Some(v) if !v.is_zero() => format!("${}", format_amount(v)),
            _ => NOT_AVAILABLE.to_string(),
        };
        doc.push_row(vec![
            (index + 1).to_string(),
            or_not_available(order.pr_number.as_deref()),
            or_not_available(order.project_name.as_deref()),
            or_not_available(order.all_categories.as_deref()),
            or_not_available(order.supplier_name.as_deref()),
            or_not_available(Some(order.po_number.as_str())),
            value,
            format_optional_date(order.date),
            or_not_available(order.status.as_deref()),
            or_not_available(order.updates.as_deref()),
        ]);
    }
    doc
}

/// `application/pdf`, shown inline as `<prefix>_<YYYY-MM-DD>.pdf`.
pub fn pdf_response(bytes: Vec<u8>, prefix: &str, now: &DateTime<Local>) -> AppResult<Response> {
    let filename = format!("{prefix}_{}.pdf", now.format("%Y-%m-%d"));
    file_response(
        bytes,
        "application/pdf",
        &format!("inline; filename=\"{filename}\""),
    )
}

/// CSV download named `reports_export_<YYYY-MM-DD_HHMMSS>.csv`.
pub fn csv_response(body: String, now: &DateTime<Local>) -> AppResult<Response> {
    let filename = format!("reports_export_{}.csv", now.format("%Y-%m-%d_%H%M%S"));
    file_response(
        body.into_bytes(),
        "text/csv; charset=utf-8",
        &format!("attachment; filename=\"{filename}\""),
    )
}

/// Printable page.
pub fn html_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}

fn file_response(bytes: Vec<u8>, content_type: &str, disposition: &str) -> AppResult<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_DISPOSITION, disposition)
        .body(Body::from(bytes))
        .map_err(|e| AppError::InternalError(format!("Failed to build export response: {e}")))
}
