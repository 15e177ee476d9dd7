//! Backend upload collaborator: request shapes and the transport seam.

use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;
use reqwest::{Response, StatusCode};
use shared::{
    domain::UploadId,
    error::{ApiError, ApiException, ErrorCode},
    protocol::UploadEvent,
};
use url::Url;

use crate::error::UploadError;

const PDF_MAGIC: &[u8] = b"%PDF-";
pub const PDF_MIME_TYPE: &str = "application/pdf";

pub type UploadEventStream = BoxStream<'static, Result<UploadEvent, UploadError>>;

#[derive(Debug, Clone)]
pub struct PaperUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PaperUpload {
    /// Accepts only `.pdf` names whose payload carries the PDF header.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let file_name = file_name.into();
        let has_pdf_extension = Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !has_pdf_extension {
            return Err(UploadError::InvalidPdf(format!(
                "'{file_name}' does not have a .pdf extension"
            )));
        }
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(UploadError::InvalidPdf(format!(
                "'{file_name}' is missing the %PDF- header"
            )));
        }
        Ok(Self { file_name, bytes })
    }

    pub async fn from_path(path: &Path) -> Result<Self, UploadError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            UploadError::InvalidPdf(format!("could not read '{}': {err}", path.display()))
        })?;
        Self::new(file_name, bytes)
    }
}

#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn start_upload(&self, upload: PaperUpload) -> Result<UploadId, UploadError>;
    async fn progress_events(&self, upload_id: UploadId)
        -> Result<UploadEventStream, UploadError>;
}

pub fn progress_socket_url(server_url: &str, upload_id: UploadId) -> Result<Url, UploadError> {
    let invalid = |reason: &str| UploadError::InvalidServerUrl {
        url: server_url.to_string(),
        reason: reason.to_string(),
    };
    let mut url = Url::parse(server_url.trim()).map_err(|err| invalid(&err.to_string()))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        _ => return Err(invalid("scheme must be http or https")),
    };
    url.set_scheme(scheme)
        .map_err(|()| invalid("could not switch to websocket scheme"))?;
    let base = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{base}/ws/uploads/{upload_id}"));
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

pub fn endpoint(server_url: &str, path: &str) -> String {
    format!("{}/{}", server_url.trim().trim_end_matches('/'), path)
}

/// Passes 2xx responses through and turns everything else into an
/// [`ApiException`], preferring the backend's JSON error body.
pub async fn check_response(response: Response) -> Result<Response, UploadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let exception = match serde_json::from_str::<ApiError>(&body) {
        Ok(api) => ApiException::from(api),
        Err(_) => ApiException::new(
            code_for_status(status),
            if body.trim().is_empty() {
                status.to_string()
            } else {
                format!("{status}: {}", body.trim())
            },
        ),
    };
    Err(UploadError::Api(exception))
}

fn code_for_status(status: StatusCode) -> ErrorCode {
    match status {
        StatusCode::UNAUTHORIZED => ErrorCode::Unauthorized,
        StatusCode::FORBIDDEN => ErrorCode::Forbidden,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::PAYLOAD_TOO_LARGE => ErrorCode::PayloadTooLarge,
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ErrorCode::UnsupportedMedia,
        s if s.is_client_error() => ErrorCode::Validation,
        _ => ErrorCode::Internal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_pdf_with_header_and_any_case_extension() {
        let upload = PaperUpload::new("Paper.PDF", b"%PDF-1.7\n...".to_vec()).expect("valid");
        assert_eq!(upload.file_name, "Paper.PDF");
    }

    #[test]
    fn rejects_wrong_extension_or_missing_header() {
        assert!(matches!(
            PaperUpload::new("notes.txt", b"%PDF-1.4".to_vec()),
            Err(UploadError::InvalidPdf(_))
        ));
        assert!(matches!(
            PaperUpload::new("paper.pdf", b"PK\x03\x04".to_vec()),
            Err(UploadError::InvalidPdf(msg)) if msg.contains("%PDF-")
        ));
    }

    #[test]
    fn builds_websocket_url_from_http_base() {
        let url = progress_socket_url("http://127.0.0.1:8080/", UploadId(42)).expect("url");
        assert_eq!(url.as_str(), "ws://127.0.0.1:8080/ws/uploads/42");

        let nested =
            progress_socket_url("https://scilit.example.org/api?x=1", UploadId(7)).expect("url");
        assert_eq!(nested.as_str(), "wss://scilit.example.org/api/ws/uploads/7");
    }

    #[test]
    fn rejects_non_http_server_url() {
        assert!(matches!(
            progress_socket_url("ftp://example.org", UploadId(1)),
            Err(UploadError::InvalidServerUrl { .. })
        ));
        assert!(matches!(
            progress_socket_url("not a url", UploadId(1)),
            Err(UploadError::InvalidServerUrl { .. })
        ));
    }

    #[test]
    fn maps_status_codes_to_error_codes() {
        assert_eq!(code_for_status(StatusCode::UNAUTHORIZED), ErrorCode::Unauthorized);
        assert_eq!(
            code_for_status(StatusCode::PAYLOAD_TOO_LARGE),
            ErrorCode::PayloadTooLarge
        );
        assert_eq!(code_for_status(StatusCode::CONFLICT), ErrorCode::Validation);
        assert_eq!(code_for_status(StatusCode::BAD_GATEWAY), ErrorCode::Internal);
    }
}
