use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use td_core::{AppState, FileId, FileRecord, Row, RowSet, UploadStatus};
use td_data::api::UploadResponse;
use td_data::{ApiError, FileApi, FileSession, SessionError};

/// Scripted API that counts every request it receives
#[derive(Default)]
struct FakeApi {
    requests: AtomicUsize,
    upload_error: Mutex<Option<ApiError>>,
    list_error: Mutex<Option<ApiError>>,
    fetch_error: Mutex<Option<ApiError>>,
    files: Mutex<Vec<FileRecord>>,
}

impl FakeApi {
    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn trial_rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| Row::new().with("studyId", format!("NCT-{}", i)))
        .collect()
}

#[async_trait]
impl FileApi for FakeApi {
    async fn upload(&self, file_name: &str, _bytes: Vec<u8>) -> Result<UploadResponse, ApiError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.upload_error.lock().clone() {
            return Err(err);
        }
        self.files.lock().push(FileRecord {
            id: FileId("1".into()),
            displayname: file_name.to_string(),
        });
        Ok(UploadResponse {
            id: FileId("1".into()),
            data: trial_rows(3),
        })
    }

    async fn list(&self) -> Result<Vec<FileRecord>, ApiError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.list_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(self.files.lock().clone()),
        }
    }

    async fn fetch(&self, _id: &FileId) -> Result<Vec<Row>, ApiError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.fetch_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(trial_rows(2)),
        }
    }

    async fn delete(&self, id: &FileId) -> Result<(), ApiError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.files.lock().retain(|f| &f.id != id);
        Ok(())
    }
}

fn session() -> (Arc<FakeApi>, FileSession) {
    let api = Arc::new(FakeApi::default());
    let state = Arc::new(AppState::default());
    (api.clone(), FileSession::new(api, state))
}

#[tokio::test]
async fn test_upload_replaces_rows_and_refreshes_listing() {
    let (api, session) = session();
    session.upload("trials.csv", b"studyId\nNCT-0\n".to_vec()).await.unwrap();

    let state = session.state();
    assert_eq!(state.rows().len(), 3);
    assert_eq!(state.selected_file(), Some(FileId("1".into())));
    assert_eq!(state.files().len(), 1);
    assert_eq!(state.upload_status(), UploadStatus::Idle);
    assert_eq!(api.requests(), 2);
}

#[tokio::test]
async fn test_unsupported_extension_sends_nothing() {
    let (api, session) = session();
    session.state().replace_rows(RowSet::new(trial_rows(5)), "seed");

    let err = session.upload("notes.txt", b"hello".to_vec()).await.unwrap_err();
    assert_eq!(err, SessionError::UnsupportedFile("notes.txt".into()));
    assert_eq!(api.requests(), 0);
    assert_eq!(session.state().rows().len(), 5);
    assert_eq!(
        session.state().upload_status().error(),
        Some("Only .csv and .xlsx files are allowed.")
    );
}

#[tokio::test]
async fn test_second_upload_while_pending_is_rejected() {
    let (api, session) = session();
    assert!(session.state().begin_upload("first.csv"));

    let err = session.upload("second.csv", Vec::new()).await.unwrap_err();
    assert_eq!(err, SessionError::UploadInProgress);
    assert_eq!(api.requests(), 0);
    assert!(session.state().upload_status().is_pending());

    // A rejected extension must not clobber the pending slot either.
    let _ = session.upload("third.txt", Vec::new()).await;
    assert!(session.state().upload_status().is_pending());
}

#[tokio::test]
async fn test_failed_upload_keeps_rows_and_shows_detail() {
    let (api, session) = session();
    session.state().replace_rows(RowSet::new(trial_rows(4)), "seed");
    *api.upload_error.lock() = Some(ApiError::Server {
        status: 400,
        detail: Some("Duplicate file".into()),
    });

    assert!(session.upload("trials.xlsx", vec![1, 2, 3]).await.is_err());
    assert_eq!(session.state().rows().len(), 4);
    assert_eq!(session.state().upload_status().error(), Some("Duplicate file"));

    *api.upload_error.lock() = Some(ApiError::Network("connection refused".into()));
    assert!(session.upload("trials.xlsx", vec![1]).await.is_err());
    assert_eq!(session.state().upload_status().error(), Some("Upload failed"));
}

#[tokio::test]
async fn test_fetch_failure_resets_rows() {
    let (api, session) = session();
    session.open_file(FileId("9".into())).await.unwrap();
    assert_eq!(session.state().rows().len(), 2);

    *api.fetch_error.lock() = Some(ApiError::Network("timeout".into()));
    assert!(session.open_file(FileId("9".into())).await.is_err());
    assert!(session.state().rows().is_empty());
}

#[tokio::test]
async fn test_listing_failure_resets_files() {
    let (api, session) = session();
    api.files.lock().push(FileRecord {
        id: FileId("4".into()),
        displayname: "a.csv".into(),
    });
    session.refresh_files().await.unwrap();
    assert_eq!(session.state().files().len(), 1);

    *api.list_error.lock() = Some(ApiError::Parse("expected array".into()));
    assert!(session.refresh_files().await.is_err());
    assert!(session.state().files().is_empty());
}

#[tokio::test]
async fn test_deleting_selected_file_clears_rows() {
    let (_api, session) = session();
    session.upload("trials.csv", Vec::new()).await.unwrap();
    assert_eq!(session.state().rows().len(), 3);

    session.delete_file(FileId("1".into())).await.unwrap();
    assert!(session.state().rows().is_empty());
    assert_eq!(session.state().selected_file(), None);
    assert!(session.state().files().is_empty());
}

#[tokio::test]
async fn test_upload_path_reads_file() {
    let (api, session) = session();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trials.csv");
    std::fs::write(&path, "studyId\nNCT-1\n").unwrap();

    session.upload_path(&path).await.unwrap();
    assert_eq!(api.requests(), 2);

    let missing = dir.path().join("missing.csv");
    assert!(matches!(
        session.upload_path(&missing).await,
        Err(SessionError::Read { .. })
    ));
    assert_eq!(api.requests(), 2);
}
