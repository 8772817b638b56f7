//! CSV export.
//!
//! Output is UTF-8 with a byte-order mark. The header row is the key list of
//! the first record; every following row is emitted in header order, so all
//! rows share one column count even if a later record lacks a key.

use indexmap::IndexMap;

/// One exported row: column name to cell text, in column order.
pub type CsvRecord = IndexMap<String, String>;

const BOM: &str = "\u{feff}";

/// Render `records` as CSV text.
///
/// An empty slice produces only the BOM.
pub fn render_csv(records: &[CsvRecord]) -> String {
    let mut out = String::from(BOM);
    let Some(first) = records.first() else {
        return out;
    };

    let header: Vec<&str> = first.keys().map(String::as_str).collect();
    write_line(&mut out, header.iter().copied());

    for record in records {
        write_line(
            &mut out,
            header
                .iter()
                .map(|key| record.get(*key).map(String::as_str).unwrap_or("")),
        );
    }
    out
}

fn write_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

fn push_field(out: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\n' | '\r' | '\t' | ' ' | '\\'));
    if !needs_quotes {
        out.push_str(field);
        return;
    }
    out.push('"');
    for ch in field.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> CsvRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn lines(csv: &str) -> Vec<&str> {
        csv.trim_start_matches('\u{feff}').lines().collect()
    }

    #[test]
    fn starts_with_bom_and_header_from_first_record() {
        let csv = render_csv(&[
            record(&[("pr_number", "PR-1"), ("value", "10.00")]),
            record(&[("pr_number", "PR-2"), ("value", "20.00")]),
        ]);
        assert!(csv.starts_with('\u{feff}'));
        assert_eq!(lines(&csv), vec!["pr_number,value", "PR-1,10.00", "PR-2,20.00"]);
    }

    #[test]
    fn rows_follow_header_order_and_count() {
        let csv = render_csv(&[
            record(&[("a", "1"), ("b", "2"), ("c", "3")]),
            record(&[("c", "z"), ("a", "x")]),
        ]);
        let rows = lines(&csv);
        assert_eq!(rows[2], "x,,z");
        assert!(rows.iter().all(|r| r.split(',').count() == 3));
    }

    #[test]
    fn quotes_fields_with_delimiters() {
        let csv = render_csv(&[record(&[("name", "Acme, \"Intl\""), ("note", "two words")])]);
        assert_eq!(lines(&csv)[1], "\"Acme, \"\"Intl\"\"\",\"two words\"");
    }

    #[test]
    fn empty_input_is_only_bom() {
        assert_eq!(render_csv(&[]), "\u{feff}");
    }
}
