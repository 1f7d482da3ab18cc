// Spreadsheet parsing via calamine. Only the first worksheet is read and
// its first row is taken as the header row.

use calamine::Reader;

use super::{DataTable, ParsedData};
use crate::types::{AppError, AppResult, FileFormat};

pub fn parse(bytes: &[u8]) -> AppResult<ParsedData> {
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| parse_error(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| parse_error("workbook contains no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| parse_error(format!("sheet '{}': {}", sheet_name, e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(cell_to_string).collect(),
        None => return Err(parse_error(format!("sheet '{}' is empty", sheet_name))),
    };

    let rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(ParsedData::Table(DataTable { headers, rows }))
}

fn cell_to_string(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::Empty => String::new(),
        calamine::Data::String(s) => s.clone(),
        calamine::Data::Float(f) => f.to_string(),
        calamine::Data::Int(i) => i.to_string(),
        calamine::Data::Bool(b) => b.to_string(),
        calamine::Data::DateTime(dt) => dt.to_string(),
        _ => String::new(),
    }
}

fn parse_error(reason: String) -> AppError {
    AppError::Parse {
        format: FileFormat::Excel,
        reason,
    }
}
