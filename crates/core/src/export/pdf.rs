//! Landscape A4 table export.
//!
//! Layout is computed here as a list of draw operations per page: brand
//! line, title, generation stamp, a filled header row and zebra-striped body
//! rows. The header row is repeated on every page. [`printpdf`] serializes
//! the pages using the built-in Helvetica fonts, so nothing is embedded.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, path::PaintMode, PdfDocument, PdfLayerReference, Rect,
};

use super::{Align, Column, TableDocument};
use crate::error::CoreError;

const PAGE_W_MM: f64 = 297.0;
const PAGE_H_MM: f64 = 210.0;
const MARGIN_MM: f64 = 10.0;
const ROW_H_MM: f64 = 10.0;
const CELL_PAD_MM: f64 = 1.0;
const PT_PER_MM: f64 = 72.0 / 25.4;
const BORDER_PT: f32 = 0.57;

type Rgb = (u8, u8, u8);

const BRAND_COLOR: Rgb = (103, 126, 234);
const BLACK: Rgb = (0, 0, 0);
const WHITE: Rgb = (255, 255, 255);
const GRAY_TEXT: Rgb = (100, 100, 100);
const STRIPE: Rgb = (245, 245, 245);
const BORDER: Rgb = (221, 221, 221);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn builtin(self) -> BuiltinFont {
        match self {
            Font::Regular => BuiltinFont::Helvetica,
            Font::Bold => BuiltinFont::HelveticaBold,
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    /// Width of `text` in millimetres at `size` points.
    fn text_width_mm(self, text: &str, size: f64) -> f64 {
        let units: u32 = text
            .chars()
            .map(|c| {
                let code = c as u32;
                if (32..=126).contains(&code) {
                    u32::from(self.widths()[(code - 32) as usize])
                } else {
                    556
                }
            })
            .sum();
        f64::from(units) * size / 1000.0 / PT_PER_MM
    }
}

/// One drawing step. Coordinates are millimetres from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
enum Op {
    Cell {
        x: f64,
        top: f64,
        w: f64,
        h: f64,
        fill: Rgb,
    },
    Text {
        x: f64,
        baseline: f64,
        text: String,
        font: Font,
        size: f64,
        color: Rgb,
    },
}

/// Render `doc` to PDF bytes.
pub fn render_pdf(doc: &TableDocument) -> Result<Vec<u8>, CoreError> {
    write_pages(&layout_pages(doc), &doc.title)
}

struct PageBuilder {
    ops: Vec<Op>,
    y: f64,
}

impl PageBuilder {
    fn new() -> Self {
        Self {
            ops: Vec::new(),
            y: MARGIN_MM,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn cell(
        &mut self,
        x: f64,
        w: f64,
        h: f64,
        text: &str,
        align: Align,
        font: Font,
        size: f64,
        color: Rgb,
        fill: Option<Rgb>,
    ) {
        let top = self.y;
        if let Some(fill) = fill {
            self.ops.push(Op::Cell { x, top, w, h, fill });
        }

        let text = fit_text(text, font, size, w - 2.0 * CELL_PAD_MM);
        if text.is_empty() {
            return;
        }
        let tw = font.text_width_mm(&text, size);
        let x = match align {
            Align::Left => x + CELL_PAD_MM,
            Align::Center => x + (w - tw) / 2.0,
            Align::Right => x + w - CELL_PAD_MM - tw,
        };
        self.ops.push(Op::Text {
            x,
            baseline: top + h / 2.0 + size * 0.35 / PT_PER_MM,
            text,
            font,
            size,
            color,
        });
    }

    /// Full-width centered line without a border, then advance.
    fn banner(&mut self, text: &str, font: Font, size: f64, color: Rgb, h: f64) {
        let width = PAGE_W_MM - 2.0 * MARGIN_MM;
        self.cell(MARGIN_MM, width, h, text, Align::Center, font, size, color, None);
        self.y += h;
    }

    fn row(&mut self, columns: &[Column], cells: &[String], font: Font, size: f64, color: Rgb, fill: Rgb) {
        let mut x = MARGIN_MM;
        for (column, text) in columns.iter().zip(cells) {
            self.cell(x, column.width_mm, ROW_H_MM, text, column.align, font, size, color, Some(fill));
            x += column.width_mm;
        }
        self.y += ROW_H_MM;
    }

    fn header(&mut self, columns: &[Column]) {
        let labels: Vec<String> = columns.iter().map(|c| c.label.to_string()).collect();
        self.row(columns, &labels, Font::Bold, 9.0, WHITE, BRAND_COLOR);
    }

    fn has_room_for_row(&self) -> bool {
        self.y + ROW_H_MM <= PAGE_H_MM - MARGIN_MM
    }
}

fn layout_pages(doc: &TableDocument) -> Vec<Vec<Op>> {
    let mut pages = Vec::new();
    let mut page = PageBuilder::new();

    page.banner(&doc.brand, Font::Bold, 16.0, BRAND_COLOR, 10.0);
    page.banner(&doc.title, Font::Bold, 14.0, BLACK, 10.0);
    page.banner(
        &format!("Generated: {}", doc.generated),
        Font::Regular,
        10.0,
        GRAY_TEXT,
        8.0,
    );
    page.y += 5.0;
    page.header(doc.columns);

    for (i, cells) in doc.rows.iter().enumerate() {
        if !page.has_room_for_row() {
            pages.push(std::mem::take(&mut page.ops));
            page = PageBuilder::new();
            page.header(doc.columns);
        }
        let fill = if i % 2 == 1 { STRIPE } else { WHITE };
        page.row(doc.columns, cells, Font::Regular, 8.0, BLACK, fill);
    }
    pages.push(page.ops);
    pages
}

fn write_pages(pages: &[Vec<Op>], title: &str) -> Result<Vec<u8>, CoreError> {
    let (w, h) = (Mm(PAGE_W_MM as f32), Mm(PAGE_H_MM as f32));
    let (pdf, first_page, first_layer) = PdfDocument::new(title, w, h, "Table");
    let regular = pdf.add_builtin_font(Font::Regular.builtin()).map_err(pdf_error)?;
    let bold = pdf.add_builtin_font(Font::Bold.builtin()).map_err(pdf_error)?;

    for (i, ops) in pages.iter().enumerate() {
        let layer = if i == 0 {
            pdf.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = pdf.add_page(w, h, "Table");
            pdf.get_page(page).get_layer(layer)
        };
        draw(&layer, ops, &regular, &bold);
    }

    pdf.save_to_bytes().map_err(pdf_error)
}

fn draw(layer: &PdfLayerReference, ops: &[Op], regular: &IndirectFontRef, bold: &IndirectFontRef) {
    layer.set_outline_thickness(BORDER_PT);
    layer.set_outline_color(color(BORDER));
    for op in ops {
        match op {
            Op::Cell { x, top, w, h, fill } => {
                layer.set_fill_color(color(*fill));
                let rect = Rect::new(
                    Mm(*x as f32),
                    Mm((PAGE_H_MM - top - h) as f32),
                    Mm((x + w) as f32),
                    Mm((PAGE_H_MM - top) as f32),
                )
                .with_mode(PaintMode::FillStroke);
                layer.add_rect(rect);
            }
            Op::Text {
                x,
                baseline,
                text,
                font,
                size,
                color: text_color,
            } => {
                layer.set_fill_color(color(*text_color));
                let font_ref = match font {
                    Font::Regular => regular,
                    Font::Bold => bold,
                };
                layer.use_text(
                    text.as_str(),
                    *size as f32,
                    Mm(*x as f32),
                    Mm((PAGE_H_MM - baseline) as f32),
                    font_ref,
                );
            }
        }
    }
}

fn pdf_error(err: printpdf::Error) -> CoreError {
    CoreError::Internal(format!("PDF rendering failed: {err:?}"))
}

/// Shorten `text` with a trailing `...` until it fits `max_mm`.
fn fit_text(text: &str, font: Font, size: f64, max_mm: f64) -> String {
    let text: String = text.chars().map(|c| if c.is_control() { ' ' } else { c }).collect();
    if font.text_width_mm(&text, size) <= max_mm {
        return text;
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "...";
        if font.text_width_mm(&candidate, size) <= max_mm {
            return candidate;
        }
    }
    String::new()
}

fn color((r, g, b): Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

/// Helvetica advance widths for codes 32..=126 (1/1000 em).
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for codes 32..=126 (1/1000 em).
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{INVOICE_COLUMNS, PURCHASE_ORDER_COLUMNS};

    fn doc_with_rows(n: usize) -> TableDocument {
        let mut doc = TableDocument::new("OPSBOARD", "Invoices Management", "now", INVOICE_COLUMNS);
        for i in 0..n {
            doc.push_row(vec![(i + 1).to_string(), format!("PR-{i}"), "Tower (North)".into()]);
        }
        doc
    }

    fn texts(ops: &[Op]) -> Vec<&str> {
        ops.iter()
            .filter_map(|op| match op {
                Op::Text { text, .. } => Some(text.as_str()),
                Op::Cell { .. } => None,
            })
            .collect()
    }

    #[test]
    fn produces_a_pdf_file() {
        let bytes = render_pdf(&doc_with_rows(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn first_page_carries_title_block_and_rows() {
        let pages = layout_pages(&doc_with_rows(3));
        assert_eq!(pages.len(), 1);
        let lines = texts(&pages[0]);
        assert_eq!(&lines[..3], ["OPSBOARD", "Invoices Management", "Generated: now"]);
        assert!(lines.contains(&"Tower (North)"));
    }

    #[test]
    fn long_tables_break_across_pages() {
        // 14 rows fit under the title block, 18 on each following page.
        assert_eq!(layout_pages(&doc_with_rows(14)).len(), 1);
        assert_eq!(layout_pages(&doc_with_rows(15)).len(), 2);
        assert_eq!(layout_pages(&doc_with_rows(40)).len(), 3);
    }

    #[test]
    fn header_repeats_on_each_page() {
        for page in layout_pages(&doc_with_rows(40)) {
            assert_eq!(texts(&page).iter().filter(|t| **t == "PR Total Value").count(), 1);
        }
    }

    #[test]
    fn rows_stay_inside_the_bottom_margin() {
        for page in layout_pages(&doc_with_rows(40)) {
            for op in page {
                if let Op::Cell { top, h, .. } = op {
                    assert!(top + h <= PAGE_H_MM - MARGIN_MM + 1e-9);
                }
            }
        }
    }

    #[test]
    fn overflowing_text_is_truncated() {
        let fitted = fit_text(&"W".repeat(80), Font::Regular, 8.0, 28.0);
        assert!(fitted.ends_with("..."));
        assert!(Font::Regular.text_width_mm(&fitted, 8.0) <= 28.0);
    }

    #[test]
    fn right_aligned_text_ends_at_the_cell_padding() {
        let mut page = PageBuilder::new();
        page.cell(10.0, 40.0, ROW_H_MM, "1,500.00", Align::Right, Font::Regular, 8.0, BLACK, None);
        let Op::Text { x, ref text, .. } = page.ops[0] else {
            panic!("expected text");
        };
        let end = x + Font::Regular.text_width_mm(text, 8.0);
        assert!((end - (50.0 - CELL_PAD_MM)).abs() < 1e-9);
    }

    #[test]
    fn empty_table_still_renders_header() {
        let doc = TableDocument::new("B", "Purchase Orders", "now", PURCHASE_ORDER_COLUMNS);
        let pages = layout_pages(&doc);
        assert_eq!(pages.len(), 1);
        assert!(texts(&pages[0]).contains(&"PO Number"));
        assert!(render_pdf(&doc).is_ok());
    }
}
