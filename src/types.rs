// Type definitions and error taxonomy

use std::path::Path;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Excel,
    Json,
}

impl FileFormat {
    /// Detect the format from a file path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(FileFormat::Excel),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Excel => write!(f, "Excel"),
            FileFormat::Json => write!(f, "JSON"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Error processing {format} file: {reason}")]
    Parse { format: FileFormat, reason: String },

    #[error("Error creating index: {0}")]
    Index(String),

    #[error("Completion API error: {0}")]
    Completion(String),

    #[error("Could not find the response text in the API output.")]
    MalformedReply,

    #[error("Please upload a file first!")]
    NoDataset,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            FileFormat::from_path(Path::new("sales.xlsx")),
            Some(FileFormat::Excel)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("data/report.JSON")),
            Some(FileFormat::Json)
        );
        assert_eq!(FileFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(FileFormat::from_path(Path::new("no_extension")), None);
    }
}
