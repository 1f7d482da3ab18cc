// File loading: spreadsheet and JSON uploads parsed into ParsedData

pub mod excel;
pub mod json;
pub mod render;

use crate::types::{AppResult, FileFormat};

/// One uploaded dataset, either tabular or an arbitrary JSON tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedData {
    Table(DataTable),
    Tree(serde_json::Value),
}

/// Ordered rows of named columns, all cells stringified at parse time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// Parse raw upload bytes according to the declared format.
///
/// Malformed input is reported as `AppError::Parse`; callers must treat an
/// error as "do not proceed" and leave session state untouched.
pub fn parse_bytes(bytes: &[u8], format: FileFormat) -> AppResult<ParsedData> {
    match format {
        FileFormat::Excel => excel::parse(bytes),
        FileFormat::Json => json::parse(bytes),
    }
}
