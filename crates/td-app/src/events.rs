//! Shared-state events the app reacts to between frames

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use td_core::events::{DatasetCleared, DatasetLoaded, UploadFailed};
use td_core::EventBus;

/// Flags raised by bus handlers, which may run on a tokio worker
pub struct AppEvents {
    dataset_replaced: Arc<AtomicBool>,
}

impl AppEvents {
    pub fn subscribe(bus: &EventBus) -> Self {
        let dataset_replaced = Arc::new(AtomicBool::new(false));

        let flag = dataset_replaced.clone();
        bus.subscribe(move |loaded: &DatasetLoaded| {
            tracing::debug!(
                "{}: {} rows, {} columns",
                loaded.source_name,
                loaded.row_count,
                loaded.column_count
            );
            flag.store(true, Ordering::Release);
        });
        let flag = dataset_replaced.clone();
        bus.subscribe(move |cleared: &DatasetCleared| {
            tracing::debug!("Rows cleared: {}", cleared.reason);
            flag.store(true, Ordering::Release);
        });
        bus.subscribe(|failed: &UploadFailed| {
            tracing::warn!("Upload of {} failed: {}", failed.file_name, failed.message);
        });

        Self { dataset_replaced }
    }

    /// Whether the rows were replaced or cleared since the last call
    pub fn take_dataset_replaced(&self) -> bool {
        self.dataset_replaced.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use td_core::{AppSettings, AppState, Row, RowSet};

    use super::*;

    #[test]
    fn test_row_changes_raise_flag_once() {
        let state = AppState::new(AppSettings::default());
        let events = AppEvents::subscribe(&state.event_bus);
        assert!(!events.take_dataset_replaced());

        state.replace_rows(RowSet::new(vec![Row::new()]), "trials.csv");
        assert!(events.take_dataset_replaced());
        assert!(!events.take_dataset_replaced());

        state.clear_rows("file deleted");
        assert!(events.take_dataset_replaced());
    }

    #[test]
    fn test_failed_upload_leaves_flag_down() {
        let state = AppState::new(AppSettings::default());
        let events = AppEvents::subscribe(&state.event_bus);

        state.fail_upload("notes.txt", "Unsupported file");
        assert!(!events.take_dataset_replaced());
    }
}
