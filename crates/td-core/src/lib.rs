//! Core functionality for the clinical trial dashboard
//!
//! This crate provides the row model, date handling, derived enrollment
//! status and the shared application state used by every other crate.

pub mod dates;
pub mod enrollment;
pub mod events;
pub mod row;
pub mod settings;
pub mod state;
pub mod value;

// Re-export commonly used types
pub use dates::{compare_optional_dates, parse_date};
pub use enrollment::{EnrollmentProgress, EnrollmentStatus};
pub use events::EventBus;
pub use row::{fields, Row, RowSet};
pub use settings::{
    AppSettings, DashboardSettings, EnrollmentFilterPolicy, TableSettings, ThemeSettings,
};
pub use state::{AppState, FileId, FileRecord, UploadStatus};
pub use value::CellValue;
