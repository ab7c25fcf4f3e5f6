//! Upload, listing, fetch and delete against the file API
//!
//! Every operation updates [`AppState`] itself, so callers only need the
//! returned error for display. Failures follow one rule per operation:
//! a failed upload keeps the current rows, a failed fetch clears them and
//! a failed listing clears the file list.

use std::path::Path;
use std::sync::Arc;

use td_core::{AppState, FileId, RowSet};
use thiserror::Error;

use crate::api::{ApiError, FileApi};
use crate::sources::FileKind;

pub const UNSUPPORTED_FILE_MESSAGE: &str = "Only .csv and .xlsx files are allowed.";
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("Could not read {path}: {message}")]
    Read { path: String, message: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    /// Text shown to the user for a failed upload
    pub fn user_message(&self) -> String {
        match self {
            SessionError::UnsupportedFile(_) => UNSUPPORTED_FILE_MESSAGE.to_string(),
            SessionError::UploadInProgress => self.to_string(),
            SessionError::Read { .. } => self.to_string(),
            SessionError::Api(err) => err.detail().unwrap_or(UPLOAD_FAILED_MESSAGE).to_string(),
        }
    }
}

/// File operations bound to the shared application state
#[derive(Clone)]
pub struct FileSession {
    api: Arc<dyn FileApi>,
    state: Arc<AppState>,
}

impl FileSession {
    pub fn new(api: Arc<dyn FileApi>, state: Arc<AppState>) -> Self {
        Self { api, state }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Upload a file by path. The extension is checked before the file is
    /// read or anything is sent.
    pub async fn upload_path(&self, path: &Path) -> Result<(), SessionError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.check_extension(&file_name)?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            let err = SessionError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            };
            self.report_rejection(&file_name, &err.user_message());
            err
        })?;
        self.upload(&file_name, bytes).await
    }

    /// Upload file contents; on success the returned rows become the
    /// current set and the listing is refreshed.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), SessionError> {
        self.check_extension(file_name)?;

        if !self.state.begin_upload(file_name) {
            tracing::warn!("Rejected upload of {}: another upload is pending", file_name);
            return Err(SessionError::UploadInProgress);
        }

        tracing::info!("Uploading {} ({} bytes)", file_name, bytes.len());
        match self.api.upload(file_name, bytes).await {
            Ok(response) => {
                self.state.finish_upload();
                self.state.select_file(Some(response.id));
                self.state.replace_rows(RowSet::new(response.data), file_name);
                // Listing errors are recorded by refresh_files.
                let _ = self.refresh_files().await;
                Ok(())
            }
            Err(err) => {
                tracing::error!("Upload of {} failed: {}", file_name, err);
                let err = SessionError::from(err);
                self.state.fail_upload(file_name, &err.user_message());
                Err(err)
            }
        }
    }

    fn check_extension(&self, file_name: &str) -> Result<FileKind, SessionError> {
        FileKind::from_name(file_name).ok_or_else(|| {
            tracing::warn!("Rejected {}: unsupported extension", file_name);
            self.report_rejection(file_name, UNSUPPORTED_FILE_MESSAGE);
            SessionError::UnsupportedFile(file_name.to_string())
        })
    }

    /// Show a rejection without disturbing an upload that is in flight
    fn report_rejection(&self, file_name: &str, message: &str) {
        if !self.state.upload_status().is_pending() {
            self.state.fail_upload(file_name, message);
        }
    }

    /// Reload the server's file listing
    pub async fn refresh_files(&self) -> Result<(), SessionError> {
        match self.api.list().await {
            Ok(files) => {
                tracing::debug!("Listed {} files", files.len());
                self.state.set_files(files);
                Ok(())
            }
            Err(err) => {
                tracing::error!("Listing files failed: {}", err);
                self.state.set_files(Vec::new());
                Err(err.into())
            }
        }
    }

    /// Select a stored file and load its rows
    pub async fn open_file(&self, id: FileId) -> Result<(), SessionError> {
        self.state.select_file(Some(id.clone()));
        match self.api.fetch(&id).await {
            Ok(rows) => {
                let name = self
                    .state
                    .files()
                    .into_iter()
                    .find(|f| f.id == id)
                    .map(|f| f.displayname)
                    .unwrap_or_else(|| id.to_string());
                self.state.replace_rows(RowSet::new(rows), &name);
                Ok(())
            }
            Err(err) => {
                tracing::error!("Fetching file {} failed: {}", id, err);
                self.state.clear_rows("fetch failed");
                Err(err.into())
            }
        }
    }

    /// Delete a stored file. Deleting the selected file also clears the
    /// current rows.
    pub async fn delete_file(&self, id: FileId) -> Result<(), SessionError> {
        if let Err(err) = self.api.delete(&id).await {
            tracing::error!("Deleting file {} failed: {}", id, err);
            return Err(err.into());
        }
        tracing::info!("Deleted file {}", id);

        if self.state.selected_file().as_ref() == Some(&id) {
            self.state.select_file(None);
            self.state.clear_rows("selected file deleted");
        }
        self.refresh_files().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            SessionError::UnsupportedFile("a.txt".into()).user_message(),
            "Only .csv and .xlsx files are allowed."
        );
        let server = SessionError::Api(ApiError::Server {
            status: 400,
            detail: Some("File too large".into()),
        });
        assert_eq!(server.user_message(), "File too large");
        let bare = SessionError::Api(ApiError::Server { status: 502, detail: None });
        assert_eq!(bare.user_message(), "Upload failed");
        let network = SessionError::Api(ApiError::Network("refused".into()));
        assert_eq!(network.user_message(), "Upload failed");
    }
}
