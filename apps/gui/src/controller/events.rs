//! UI/backend events and error modeling for the desktop controller.

use client_core::UploadError;
use shared::{
    domain::{UploadId, UserProfile},
    error::ErrorCode,
    protocol::UploadEvent,
};

use crate::backend_bridge::commands::UploadTicket;

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    LoggedIn(UserProfile),
    LoggedOut,
    UploadAccepted {
        ticket: UploadTicket,
        upload_id: UploadId,
    },
    UploadProgress {
        ticket: UploadTicket,
        event: UploadEvent,
    },
    UploadFailed {
        ticket: UploadTicket,
        message: String,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Processing,
    Unknown,
}

impl UiErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            UiErrorCategory::Auth => "Authentication",
            UiErrorCategory::Transport => "Connection",
            UiErrorCategory::Validation => "Validation",
            UiErrorCategory::Processing => "Processing",
            UiErrorCategory::Unknown => "Unexpected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Login,
    Upload,
    General,
}

pub fn classify_login_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("backend worker startup failure") {
        "Backend worker startup failure; verify local app environment and retry.".to_string()
    } else if lower.contains("error sending request")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Server unreachable; check URL/network and retry sign-in.".to_string()
    } else {
        format!("Login failed: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    /// Classifies free-form failure text, e.g. worker startup problems or
    /// queue errors that never became an [`UploadError`].
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("forbidden")
            || lower.contains("not logged in")
            || lower.contains("session expired")
        {
            UiErrorCategory::Auth
        } else if lower.contains("processing failed") {
            UiErrorCategory::Processing
        } else if lower.contains("invalid")
            || lower.contains("missing")
            || lower.contains("malformed")
            || lower.contains("not a pdf")
        {
            UiErrorCategory::Validation
        } else if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("connection")
            || lower.contains("network")
            || lower.contains("transport")
            || lower.contains("unavailable")
            || lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_upload_error(context: UiErrorContext, err: &UploadError) -> Self {
        let category = match err {
            UploadError::NotLoggedIn(_) => UiErrorCategory::Auth,
            UploadError::Api(api) => match api.code {
                ErrorCode::Unauthorized | ErrorCode::Forbidden => UiErrorCategory::Auth,
                ErrorCode::Validation
                | ErrorCode::PayloadTooLarge
                | ErrorCode::UnsupportedMedia
                | ErrorCode::NotFound => UiErrorCategory::Validation,
                ErrorCode::Internal => UiErrorCategory::Unknown,
            },
            UploadError::InvalidPdf(_)
            | UploadError::InvalidServerUrl { .. }
            | UploadError::Protocol(_) => UiErrorCategory::Validation,
            UploadError::Transport(_) | UploadError::WebSocket(_) => UiErrorCategory::Transport,
            UploadError::Processing(_) => UiErrorCategory::Processing,
        };
        let message = match context {
            UiErrorContext::Login if category != UiErrorCategory::Auth => {
                classify_login_failure(&err.to_string())
            }
            _ => err.to_string(),
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::ProcessingFailure;
    use shared::error::ApiException;

    #[test]
    fn classifies_queue_disconnect_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::General,
            "Backend command processor disconnected (possible startup/runtime failure)",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert!(!err.requires_reauth());
    }

    #[test]
    fn rejected_credentials_require_reauth() {
        let err = UiError::from_upload_error(
            UiErrorContext::Login,
            &UploadError::Api(ApiException::new(ErrorCode::Unauthorized, "unknown user")),
        );
        assert_eq!(err.category(), UiErrorCategory::Auth);
        assert!(err.requires_reauth());
        assert_eq!(err.context(), UiErrorContext::Login);

        let missing = UiError::from_upload_error(
            UiErrorContext::Upload,
            &UploadError::NotLoggedIn("missing user"),
        );
        assert!(missing.requires_reauth());
    }

    #[test]
    fn upload_failures_map_to_their_categories() {
        let too_large = UiError::from_upload_error(
            UiErrorContext::Upload,
            &UploadError::Api(ApiException::new(ErrorCode::PayloadTooLarge, "max 50 MB")),
        );
        assert_eq!(too_large.category(), UiErrorCategory::Validation);

        let not_pdf = UiError::from_upload_error(
            UiErrorContext::Upload,
            &UploadError::InvalidPdf("'notes.txt' does not have a .pdf extension".into()),
        );
        assert_eq!(not_pdf.category(), UiErrorCategory::Validation);

        let processing = UiError::from_upload_error(
            UiErrorContext::Upload,
            &UploadError::Processing(ProcessingFailure("ocr crashed".into())),
        );
        assert_eq!(processing.category(), UiErrorCategory::Processing);
        assert_eq!(processing.message(), "processing failed: ocr crashed");
    }

    #[test]
    fn login_transport_failures_get_friendly_text() {
        assert_eq!(
            classify_login_failure("error sending request for url (http://127.0.0.1:9/login)"),
            "Server unreachable; check URL/network and retry sign-in."
        );
        assert_eq!(
            classify_login_failure("server rejected request: Internal: db down"),
            "Login failed: server rejected request: Internal: db down"
        );
    }
}
