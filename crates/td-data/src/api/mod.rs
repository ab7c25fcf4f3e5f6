//! Client side of the file API
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `POST /api/files/upload` (multipart field `file`) → `{ id, data }`
//! - `GET /api/files/all` → `[{ id, displayname }]`
//! - `GET /api/files/data/:id` → `{ data }`
//! - `GET /api/files/delete/:id`
//!
//! Non-2xx responses carry `{ detail }`.

use async_trait::async_trait;
use serde::Deserialize;
use td_core::{FileId, FileRecord, Row};
use thiserror::Error;

use crate::sources::FileKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Server { status: u16, detail: Option<String> },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// The server's own explanation, if it sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Body of a successful upload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    pub id: FileId,
    #[serde(default)]
    pub data: Vec<Row>,
}

/// Body of a data fetch
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataResponse {
    #[serde(default)]
    pub data: Vec<Row>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Operations of the file API
#[async_trait]
pub trait FileApi: Send + Sync {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse, ApiError>;

    async fn list(&self) -> Result<Vec<FileRecord>, ApiError>;

    async fn fetch(&self, id: &FileId) -> Result<Vec<Row>, ApiError>;

    async fn delete(&self, id: &FileId) -> Result<(), ApiError>;
}

/// `FileApi` over HTTP
pub struct HttpFileApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpFileApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(server_error(status.as_u16(), &body));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl FileApi for HttpFileApi {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(upload_content_type(file_name))
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let body = self
            .send(self.client.post(self.url("/api/files/upload")).multipart(form))
            .await?;
        decode(&body)
    }

    async fn list(&self) -> Result<Vec<FileRecord>, ApiError> {
        let body = self.send(self.client.get(self.url("/api/files/all"))).await?;
        decode(&body)
    }

    async fn fetch(&self, id: &FileId) -> Result<Vec<Row>, ApiError> {
        let path = format!("/api/files/data/{}", id);
        let body = self.send(self.client.get(self.url(&path))).await?;
        decode::<DataResponse>(&body).map(|r| r.data)
    }

    async fn delete(&self, id: &FileId) -> Result<(), ApiError> {
        let path = format!("/api/files/delete/{}", id);
        self.send(self.client.get(self.url(&path))).await?;
        Ok(())
    }
}

/// Content type declared on the multipart `file` field
fn upload_content_type(file_name: &str) -> &'static str {
    FileKind::from_name(file_name).map_or("application/octet-stream", |kind| kind.mime_type())
}

/// Decode a JSON response body
pub fn decode<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Build the error for a non-2xx response. A string `detail` is kept
/// verbatim; any other JSON detail is kept as its JSON text.
pub fn server_error(status: u16, body: &[u8]) -> ApiError {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| match d {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });
    ApiError::Server { status, detail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::CellValue;

    #[test]
    fn test_decode_upload() {
        let body = br#"{"id": 7, "data": [{"studyId": "NCT-1", "currentEnrollment": 12, "active": true}]}"#;
        let response: UploadResponse = decode(body).unwrap();
        assert_eq!(response.id, FileId("7".into()));
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].number("currentEnrollment"), Some(12.0));
        assert_eq!(response.data[0].value("active"), &CellValue::Text("true".into()));
    }

    #[test]
    fn test_decode_listing() {
        let files: Vec<FileRecord> =
            decode(br#"[{"id": "a1", "displayname": "trials.csv"}]"#).unwrap();
        assert_eq!(files[0].displayname, "trials.csv");
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        assert!(matches!(decode::<DataResponse>(b"<html>"), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_server_detail() {
        let err = server_error(400, br#"{"detail": "Unsupported file type"}"#);
        assert_eq!(err.detail(), Some("Unsupported file type"));

        let err = server_error(500, b"Internal Server Error");
        assert_eq!(err, ApiError::Server { status: 500, detail: None });
    }

    #[test]
    fn test_upload_declares_content_type() {
        assert_eq!(upload_content_type("trials.CSV"), "text/csv");
        assert_eq!(
            upload_content_type("sites.xlsx"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(upload_content_type("notes"), "application/octet-stream");
    }

    #[test]
    fn test_base_url_is_normalized() {
        let api = HttpFileApi::new("http://localhost:8000/");
        assert_eq!(api.url("/api/files/all"), "http://localhost:8000/api/files/all");
    }
}
