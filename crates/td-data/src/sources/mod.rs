//! Local file sources
//!
//! Used when no API server is configured: the picked file is parsed on
//! the blocking pool and its rows replace the current set.

pub mod csv_source;
pub mod xlsx_source;

use std::path::{Path, PathBuf};

use td_core::Row;

use crate::DataError;

pub use csv_source::read_csv;
pub use xlsx_source::read_xlsx;

/// Accepted upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
}

impl FileKind {
    /// Kind from a file name's extension, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(FileKind::Csv),
            "xlsx" => Some(FileKind::Xlsx),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileKind::Csv => "text/csv",
            FileKind::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

/// Reject anything that is not `.csv` or `.xlsx`
pub fn validate_extension(name: &str) -> Result<FileKind, DataError> {
    FileKind::from_name(name).ok_or_else(|| DataError::UnsupportedFile(name.to_string()))
}

/// Parse an in-memory file of the given kind
pub fn parse_bytes(kind: FileKind, bytes: &[u8]) -> Result<Vec<Row>, DataError> {
    match kind {
        FileKind::Csv => read_csv(bytes),
        FileKind::Xlsx => read_xlsx(bytes),
    }
}

/// Read a CSV or XLSX file from disk
pub async fn load_local_file(path: PathBuf) -> Result<Vec<Row>, DataError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = validate_extension(&name)?;

    tokio::task::spawn_blocking(move || {
        let bytes = std::fs::read(&path)?;
        let rows = parse_bytes(kind, &bytes)?;
        tracing::info!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    })
    .await
    .map_err(|e| DataError::Other(format!("Loader task failed: {}", e)))?
}
