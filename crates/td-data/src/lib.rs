//! Data handling for the clinical trial dashboard
//!
//! Filtering, sorting, memoized views, chart shaping, local file sources
//! and the client side of the file API.

pub mod api;
pub mod cache;
pub mod filter;
pub mod schema;
pub mod session;
pub mod shaping;
pub mod sort;
pub mod sources;

use thiserror::Error;

// Re-exports
pub use api::{ApiError, FileApi, HttpFileApi};
pub use cache::ViewCache;
pub use filter::{filter_indices, ColumnFilter, DateRange, FilterState};
pub use schema::{generic_columns, header_label, unique_values, KeyClasses};
pub use session::{FileSession, SessionError};
pub use shaping::{has_valid_config, shape_widget, ChartData, ChartKind, ChartSpec};
pub use sort::{sort_indices, SortDirection, SortKey, SortKind, SortKindLookup, SortState};
pub use sources::{load_local_file, FileKind};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("XLSX error: {0}")]
    Xlsx(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Schema detection error: {0}")]
    SchemaDetection(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => {
                DataError::Io(std::io::Error::new(io_err.kind(), error.to_string()))
            }
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<calamine::XlsxError> for DataError {
    fn from(error: calamine::XlsxError) -> Self {
        DataError::Xlsx(error.to_string())
    }
}
