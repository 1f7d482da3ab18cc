// JSON parsing: UTF-8 decode then serde_json.

use super::ParsedData;
use crate::types::{AppError, AppResult, FileFormat};

pub fn parse(bytes: &[u8]) -> AppResult<ParsedData> {
    let text = std::str::from_utf8(bytes).map_err(|e| AppError::Parse {
        format: FileFormat::Json,
        reason: format!("invalid UTF-8: {}", e),
    })?;

    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| AppError::Parse {
        format: FileFormat::Json,
        reason: e.to_string(),
    })?;

    Ok(ParsedData::Tree(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_object() {
        let data = parse(br#"{"a": 1, "b": ["x", "y"]}"#).unwrap();
        match data {
            ParsedData::Tree(value) => {
                assert_eq!(value["a"], 1);
                assert_eq!(value["b"][1], "y");
            }
            _ => panic!("expected a JSON tree"),
        }
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let result = parse(b"{not json");
        assert!(matches!(
            result,
            Err(AppError::Parse {
                format: FileFormat::Json,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_reported() {
        let result = parse(&[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(AppError::Parse { .. })));
    }
}
