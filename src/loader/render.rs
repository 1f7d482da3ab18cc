//! Content materialization
//!
//! Renders a parsed dataset into the single plain-text blob that is both
//! embedded for retrieval and handed to the LLM as context. The rendering is
//! deterministic: the same input bytes always produce identical text.

use super::{DataTable, ParsedData};

const PREVIEW_ROWS: usize = 10;
const PREVIEW_TREE_CHARS: usize = 1200;

impl ParsedData {
    /// Render the full dataset, all rows and columns, no truncation.
    pub fn to_text(&self) -> String {
        match self {
            ParsedData::Table(table) => render_table(table, None),
            ParsedData::Tree(value) => serde_json::to_string_pretty(value)
                .unwrap_or_else(|_| value.to_string()),
        }
    }

    /// Abbreviated rendering for UI display after an upload.
    pub fn preview(&self) -> String {
        match self {
            ParsedData::Table(table) => {
                let mut text = render_table(table, Some(PREVIEW_ROWS));
                if table.rows.len() > PREVIEW_ROWS {
                    text.push_str(&format!(
                        "... {} more rows\n",
                        table.rows.len() - PREVIEW_ROWS
                    ));
                }
                text
            }
            ParsedData::Tree(_) => {
                let text = self.to_text();
                if text.chars().count() > PREVIEW_TREE_CHARS {
                    let truncated: String = text.chars().take(PREVIEW_TREE_CHARS).collect();
                    format!("{}\n...", truncated)
                } else {
                    text
                }
            }
        }
    }
}

/// Fixed-width table rendering with a leading row-index column.
fn render_table(table: &DataTable, limit: Option<usize>) -> String {
    let shown = limit.unwrap_or(table.rows.len()).min(table.rows.len());

    // Column widths cover headers and every shown cell; ragged rows may be
    // wider than the header row.
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in table.rows.iter().take(shown) {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            if i < widths.len() {
                widths[i] = widths[i].max(len);
            } else {
                widths.push(len);
            }
        }
    }

    let index_width = shown.saturating_sub(1).to_string().len().max(1);

    let mut out = String::new();
    out.push_str(&" ".repeat(index_width));
    for (i, width) in widths.iter().enumerate() {
        let header = table.headers.get(i).map(String::as_str).unwrap_or("");
        out.push_str("  ");
        out.push_str(&pad_left(header, *width));
    }
    out.push('\n');

    for (row_index, row) in table.rows.iter().take(shown).enumerate() {
        out.push_str(&pad_left(&row_index.to_string(), index_width));
        for (i, width) in widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            out.push_str("  ");
            out.push_str(&pad_left(cell, *width));
        }
        out.push('\n');
    }

    out
}

fn pad_left(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", " ".repeat(width - len), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> DataTable {
        DataTable {
            headers: vec!["name".to_string(), "age".to_string()],
            rows: vec![
                vec!["alice".to_string(), "31".to_string()],
                vec!["bob".to_string(), "24".to_string()],
            ],
        }
    }

    #[test]
    fn test_table_rendering_is_aligned() {
        let text = ParsedData::Table(sample_table()).to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("name  age"));
        assert!(lines[1].starts_with('0'));
        assert!(lines[1].ends_with("alice   31"));
        assert!(lines[2].ends_with("  bob   24"));
        // All lines share one width.
        assert_eq!(lines[0].len(), lines[1].len());
        assert_eq!(lines[1].len(), lines[2].len());
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let bytes = br#"{"b": [1, 2], "a": {"nested": true}}"#;
        let first = crate::loader::json::parse(bytes).unwrap().to_text();
        let second = crate::loader::json::parse(bytes).unwrap().to_text();
        assert_eq!(first, second);

        let table = ParsedData::Table(sample_table());
        assert_eq!(table.to_text(), table.to_text());
    }

    #[test]
    fn test_tree_rendering_is_pretty_printed() {
        let data = crate::loader::json::parse(br#"{"a": 1}"#).unwrap();
        assert_eq!(data.to_text(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_preview_truncates_long_tables() {
        let table = DataTable {
            headers: vec!["n".to_string()],
            rows: (0..25).map(|i| vec![i.to_string()]).collect(),
        };
        let preview = ParsedData::Table(table).preview();
        assert!(preview.contains("... 15 more rows"));
        // Full rendering keeps everything.
        let full = ParsedData::Table(DataTable {
            headers: vec!["n".to_string()],
            rows: (0..25).map(|i| vec![i.to_string()]).collect(),
        })
        .to_text();
        assert_eq!(full.lines().count(), 26);
    }

    #[test]
    fn test_ragged_rows_do_not_panic() {
        let table = DataTable {
            headers: vec!["a".to_string()],
            rows: vec![vec!["1".to_string(), "extra".to_string()], vec![]],
        };
        let text = ParsedData::Table(table).to_text();
        assert_eq!(text.lines().count(), 3);
    }
}
