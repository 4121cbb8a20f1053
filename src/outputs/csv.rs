//! Minimal CSV reading and writing for `results.csv`.
//!
//! Quotes fields containing the separator, quotes or line breaks; the
//! reader accepts the same dialect and tolerates CRLF.

use itertools::Itertools;
use std::borrow::Cow;
use std::io::{self, Write};
use std::mem::take;

const SEP: char = ',';

/// Accumulates fields and rows while [`parse_rows`] walks the input.
#[derive(Default)]
struct RowBuilder {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    field: String,
}

impl RowBuilder {
    fn end_field(&mut self) {
        self.row.push(take(&mut self.field));
    }

    /// Close the current row. A line holding one empty field is blank and dropped.
    fn end_row(&mut self) {
        self.end_field();
        let row = take(&mut self.row);
        if row.len() > 1 || row.first().is_some_and(|f| !f.is_empty()) {
            self.rows.push(row);
        }
    }

    fn finish(mut self) -> Vec<Vec<String>> {
        if !self.field.is_empty() || !self.row.is_empty() {
            self.end_row();
        }
        self.rows
    }
}

/// Parse CSV text into rows of fields. Blank lines are skipped and a
/// missing final newline is accepted.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut builder = RowBuilder::default();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if quoted {
            match ch {
                '"' if chars.next_if_eq(&'"').is_some() => builder.field.push('"'),
                '"' => quoted = false,
                _ => builder.field.push(ch),
            }
            continue;
        }

        match ch {
            '"' => quoted = true,
            SEP => builder.end_field(),
            '\r' => {
                chars.next_if_eq(&'\n');
                builder.end_row();
            }
            '\n' => builder.end_row(),
            _ => builder.field.push(ch),
        }
    }

    builder.finish()
}

/// Values of column `name` in every data row, using the first row as header.
pub fn column_values(text: &str, name: &str) -> Vec<String> {
    let mut rows = parse_rows(text).into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let Some(index) = header.iter().position(|h| h == name) else {
        return Vec::new();
    };
    rows.filter_map(|mut row| (index < row.len()).then(|| row.swap_remove(index)))
        .collect()
}

/// `field` as written to the file, quoted when it holds the separator,
/// a quote or a line break.
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([SEP, '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Write a single CSV row to any writer.
pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    let line = row
        .iter()
        .map(|cell| escape(cell.as_ref()))
        .join(&SEP.to_string());
    writeln!(w, "{line}")
}

/// A row rendered to a `String`, newline included.
pub fn row_to_string<S: AsRef<str>>(row: &[S]) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_row(&mut buf, row);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_row() {
        assert_eq!(row_to_string(&["a", "b", "c"]), "a,b,c\n");
    }

    #[test]
    fn test_quoting_rules() {
        let row = ["x,y", "say \"hi\"", "line\nbreak", "plain"];
        assert_eq!(
            row_to_string(&row),
            "\"x,y\",\"say \"\"hi\"\"\",\"line\nbreak\",plain\n"
        );
    }

    #[test]
    fn test_parse_reads_back_quoted_fields() {
        let mut text = row_to_string(&["url", "content"]);
        text.push_str(&row_to_string(&["https://a.com", "multi\nline, \"quoted\""]));
        text.push_str(&row_to_string(&["https://b.com", ""]));

        let rows = parse_rows(&text);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][1], "multi\nline, \"quoted\"");
        assert_eq!(rows[2], vec!["https://b.com".to_string(), String::new()]);
    }

    #[test]
    fn test_parse_handles_crlf_and_missing_trailing_newline() {
        let rows = parse_rows("a,b\r\n\r\nc,d");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_column_values() {
        let text = "id,url,title\n1,https://a.com,A\n2,https://b.com,\"B, again\"\n";
        assert_eq!(column_values(text, "url"), vec!["https://a.com", "https://b.com"]);
        assert_eq!(column_values(text, "title"), vec!["A", "B, again"]);
        assert!(column_values(text, "missing").is_empty());
        assert!(column_values("", "url").is_empty());
    }
}
