use shared::error::ApiException;
use thiserror::Error;

/// The one failure kind the upload wizard surfaces to users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("processing failed: {0}")]
pub struct ProcessingFailure(pub String);

impl ProcessingFailure {
    pub fn message(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Processing(#[from] ProcessingFailure),
    #[error("not a PDF document: {0}")]
    InvalidPdf(String),
    #[error("not logged in: {0}")]
    NotLoggedIn(&'static str),
    #[error("invalid server url '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
    #[error("server rejected request: {0}")]
    Api(#[from] ApiException),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("progress connection failed: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("malformed server payload: {0}")]
    Protocol(String),
}

impl UploadError {
    pub fn requires_reauth(&self) -> bool {
        match self {
            UploadError::NotLoggedIn(_) => true,
            UploadError::Api(api) => api.is_auth_failure(),
            _ => false,
        }
    }
}
