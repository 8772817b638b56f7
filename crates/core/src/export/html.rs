//! Printable HTML rendering of a [`TableDocument`].
//!
//! The page opens the browser's print dialog as soon as it loads.

use super::{Align, TableDocument};

const STYLE: &str = "\
body{font-family:Helvetica,Arial,sans-serif;margin:20px;color:#000}\
.brand{color:#677EEA;font-size:22px;font-weight:bold;text-align:center}\
h1{font-size:18px;text-align:center;margin:6px 0}\
.date{color:#646464;font-size:12px;text-align:center;margin-bottom:14px}\
table{width:100%;border-collapse:collapse;font-size:11px}\
th{background:#677EEA;color:#fff;padding:6px;border:1px solid #ddd}\
td{padding:6px;border:1px solid #ddd}\
tr:nth-child(even) td{background:#f5f5f5}\
.print-btn{position:fixed;top:10px;right:10px}\
@page{size:A4 landscape;margin:10mm}\
@media print{.no-print{display:none}}";

/// Render the print view for `doc`.
pub fn render_print_view(doc: &TableDocument) -> String {
    let mut out = String::with_capacity(2048 + doc.rows.len() * 256);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{} - Print</title>\n", escape(&doc.title)));
    out.push_str(&format!("<style>{STYLE}</style>\n</head>\n<body>\n"));
    out.push_str(
        "<button onclick=\"window.print()\" class=\"print-btn no-print\">Print</button>\n",
    );
    out.push_str(&format!("<div class=\"brand\">{}</div>\n", escape(&doc.brand)));
    out.push_str(&format!("<h1>{}</h1>\n", escape(&doc.title)));
    out.push_str(&format!(
        "<div class=\"date\">Generated: {}</div>\n",
        escape(&doc.generated)
    ));

    out.push_str("<table>\n<thead>\n<tr>");
    for column in doc.columns {
        out.push_str(&format!(
            "<th style=\"text-align:{}\">{}</th>",
            css_align(column.align),
            escape(column.label)
        ));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in &doc.rows {
        out.push_str("<tr>");
        for (column, cell) in doc.columns.iter().zip(row) {
            out.push_str(&format!(
                "<td style=\"text-align:{}\">{}</td>",
                css_align(column.align),
                escape(cell)
            ));
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody>\n</table>\n");
    out.push_str("<script>window.onload = function () { window.print(); };</script>\n");
    out.push_str("</body>\n</html>\n");
    out
}

fn css_align(align: Align) -> &'static str {
    match align {
        Align::Left => "left",
        Align::Center => "center",
        Align::Right => "right",
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
