use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};

use crate::events::{self, EventBus};
use crate::row::RowSet;
use crate::settings::AppSettings;

/// Identifier of a stored file on the server. The server may send it as a
/// number or a string; it is kept as text either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl<'de> Deserialize<'de> for FileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(FileId(s)),
            serde_json::Value::Number(n) => Ok(FileId(n.to_string())),
            other => Err(serde::de::Error::custom(format!("invalid file id: {}", other))),
        }
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(value: &str) -> Self {
        FileId(value.to_string())
    }
}

/// One entry of the server's file listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub displayname: String,
}

/// State of the single upload slot
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Pending { file_name: String },
    Failed { message: String },
}

impl UploadStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, UploadStatus::Pending { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            UploadStatus::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// The main application state
pub struct AppState {
    /// The event bus
    pub event_bus: Arc<EventBus>,

    /// Rows currently shown by the table and widgets
    dataset: RwLock<RowSet>,

    /// File the current rows came from, if any
    selected_file: RwLock<Option<FileId>>,

    /// Last known server file listing
    files: RwLock<Vec<FileRecord>>,

    upload: RwLock<UploadStatus>,

    /// Application settings
    pub settings: Arc<RwLock<AppSettings>>,
}

impl AppState {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            event_bus: Arc::new(EventBus::new()),
            dataset: RwLock::new(RowSet::empty()),
            selected_file: RwLock::new(None),
            files: RwLock::new(Vec::new()),
            upload: RwLock::new(UploadStatus::Idle),
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Current rows (cheap clone of a shared set)
    pub fn rows(&self) -> RowSet {
        self.dataset.read().clone()
    }

    /// Replace the row set wholesale
    pub fn replace_rows(&self, rows: RowSet, source_name: &str) {
        let row_count = rows.len();
        let column_count = rows.first().map(|r| r.len()).unwrap_or(0);
        *self.dataset.write() = rows;

        tracing::info!("Loaded {} rows from {}", row_count, source_name);
        self.event_bus.publish(events::DatasetLoaded {
            source_name: source_name.to_string(),
            row_count,
            column_count,
        });
    }

    /// Reset to an empty row set
    pub fn clear_rows(&self, reason: &str) {
        *self.dataset.write() = RowSet::empty();
        self.event_bus.publish(events::DatasetCleared {
            reason: reason.to_string(),
        });
    }

    pub fn selected_file(&self) -> Option<FileId> {
        self.selected_file.read().clone()
    }

    pub fn select_file(&self, id: Option<FileId>) {
        *self.selected_file.write() = id;
    }

    pub fn files(&self) -> Vec<FileRecord> {
        self.files.read().clone()
    }

    pub fn set_files(&self, files: Vec<FileRecord>) {
        *self.files.write() = files;
    }

    pub fn upload_status(&self) -> UploadStatus {
        self.upload.read().clone()
    }

    /// Claim the upload slot. Returns `false` when an upload is already
    /// pending; the check and the claim happen under one lock.
    pub fn begin_upload(&self, file_name: &str) -> bool {
        let mut upload = self.upload.write();
        if upload.is_pending() {
            return false;
        }
        *upload = UploadStatus::Pending {
            file_name: file_name.to_string(),
        };
        true
    }

    pub fn finish_upload(&self) {
        *self.upload.write() = UploadStatus::Idle;
    }

    /// Record a failed upload; the current rows are left untouched.
    pub fn fail_upload(&self, file_name: &str, message: &str) {
        *self.upload.write() = UploadStatus::Failed {
            message: message.to_string(),
        };
        self.event_bus.publish(events::UploadFailed {
            file_name: file_name.to_string(),
            message: message.to_string(),
        });
    }

    pub fn dismiss_upload_error(&self) {
        let mut upload = self.upload.write();
        if matches!(*upload, UploadStatus::Failed { .. }) {
            *upload = UploadStatus::Idle;
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;

    #[test]
    fn test_upload_slot_is_exclusive() {
        let state = AppState::default();
        assert!(state.begin_upload("a.csv"));
        assert!(!state.begin_upload("b.csv"));
        state.finish_upload();
        assert!(state.begin_upload("b.csv"));
    }

    #[test]
    fn test_failed_upload_keeps_rows() {
        let state = AppState::default();
        state.replace_rows(RowSet::new(vec![Row::new().with("a", 1.0)]), "seed");
        assert!(state.begin_upload("x.csv"));
        state.fail_upload("x.csv", "Only .csv and .xlsx files are allowed.");

        assert_eq!(state.rows().len(), 1);
        assert_eq!(
            state.upload_status().error(),
            Some("Only .csv and .xlsx files are allowed.")
        );
        state.dismiss_upload_error();
        assert_eq!(state.upload_status(), UploadStatus::Idle);
    }

    #[test]
    fn test_file_id_accepts_numbers_and_strings() {
        let json = r#"[{"id": 3, "displayname": "a.csv"}, {"id": "x7", "displayname": "b.xlsx"}]"#;
        let records: Vec<FileRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].id, FileId("3".into()));
        assert_eq!(records[1].id.to_string(), "x7");
    }
}
