//! Background file operations
//!
//! Work runs on the tokio runtime; anything the UI thread must apply
//! comes back as a [`TaskMessage`] and is drained once per frame.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use td_core::{AppState, FileId, Row, RowSet};
use td_data::session::UNSUPPORTED_FILE_MESSAGE;
use td_data::{load_local_file, FileKind, FileSession, HttpFileApi, SessionError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

pub enum TaskMessage {
    /// Rows read from a local file
    Loaded { source_name: String, rows: Vec<Row> },
    Failed { title: String, message: String },
}

/// Where files come from
#[derive(Clone)]
enum Backend {
    Remote(FileSession),
    Local,
}

pub struct Tasks {
    runtime: Handle,
    backend: Backend,
    state: Arc<AppState>,
    sender: UnboundedSender<TaskMessage>,
    receiver: UnboundedReceiver<TaskMessage>,
    repaint: egui::Context,
}

impl Tasks {
    pub fn new(runtime: Handle, state: Arc<AppState>, repaint: egui::Context) -> Self {
        let api_base_url = state.settings.read().api_base_url.clone();
        let backend = match api_base_url {
            Some(url) => {
                let api = Arc::new(HttpFileApi::new(url));
                Backend::Remote(FileSession::new(api, state.clone()))
            }
            None => Backend::Local,
        };
        let (sender, receiver) = unbounded_channel();
        Self {
            runtime,
            backend,
            state,
            sender,
            receiver,
            repaint,
        }
    }

    /// Whether files are stored behind the file API
    pub fn is_remote(&self) -> bool {
        matches!(self.backend, Backend::Remote(_))
    }

    /// Messages produced since the last call
    pub fn drain(&mut self) -> Vec<TaskMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            messages.push(message);
        }
        messages
    }

    pub fn upload(&self, path: PathBuf) {
        match &self.backend {
            Backend::Remote(session) => {
                let session = session.clone();
                // Other upload failures already show in the header.
                self.spawn("Upload", async move {
                    match session.upload_path(&path).await {
                        Err(SessionError::UploadInProgress) => Err(SessionError::UploadInProgress),
                        _ => Ok(()),
                    }
                });
            }
            Backend::Local => self.load_local(path),
        }
    }

    fn load_local(&self, path: PathBuf) {
        let name = file_name(&path);
        if FileKind::from_name(&name).is_none() {
            tracing::warn!("Rejected {}: unsupported extension", name);
            if !self.state.upload_status().is_pending() {
                self.state.fail_upload(&name, UNSUPPORTED_FILE_MESSAGE);
            }
            return;
        }
        if !self.state.begin_upload(&name) {
            self.send_failure("Upload", &SessionError::UploadInProgress);
            return;
        }

        let state = self.state.clone();
        let sender = self.sender.clone();
        let repaint = self.repaint.clone();
        self.runtime.spawn(async move {
            match load_local_file(path).await {
                Ok(rows) => {
                    state.finish_upload();
                    let _ = sender.send(TaskMessage::Loaded { source_name: name, rows });
                }
                Err(e) => {
                    tracing::error!("Reading {} failed: {}", name, e);
                    state.fail_upload(&name, &e.to_string());
                }
            }
            repaint.request_repaint();
        });
    }

    pub fn refresh_files(&self) {
        if let Backend::Remote(session) = &self.backend {
            let session = session.clone();
            self.spawn("Listing files failed", async move { session.refresh_files().await });
        }
    }

    pub fn open_file(&self, id: FileId) {
        if let Backend::Remote(session) = &self.backend {
            let session = session.clone();
            self.spawn("Loading file failed", async move { session.open_file(id).await });
        }
    }

    pub fn delete_file(&self, id: FileId) {
        if let Backend::Remote(session) = &self.backend {
            let session = session.clone();
            self.spawn("Deleting file failed", async move { session.delete_file(id).await });
        }
    }

    fn spawn<F>(&self, title: &'static str, task: F)
    where
        F: Future<Output = Result<(), SessionError>> + Send + 'static,
    {
        let sender = self.sender.clone();
        let repaint = self.repaint.clone();
        self.runtime.spawn(async move {
            if let Err(e) = task.await {
                let _ = sender.send(TaskMessage::Failed {
                    title: title.to_string(),
                    message: e.user_message(),
                });
            }
            repaint.request_repaint();
        });
    }

    fn send_failure(&self, title: &str, error: &SessionError) {
        let _ = self.sender.send(TaskMessage::Failed {
            title: title.to_string(),
            message: error.user_message(),
        });
    }
}

/// Apply a loaded row set on the UI thread
pub fn apply_loaded(state: &AppState, source_name: &str, rows: Vec<Row>) {
    state.select_file(None);
    state.replace_rows(RowSet::new(rows), source_name);
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
