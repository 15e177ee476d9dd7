use std::sync::Arc;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use reqwest::{header, Client};
use shared::{
    domain::{UploadId, UserId, UserProfile},
    error::{ApiException, ErrorCode},
    protocol::{LoginRequest, LoginResponse, PaperUploadResponse, UploadEvent},
};
use tokio::sync::Mutex;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info};

pub mod auth;
pub mod config;
pub mod error;
pub mod navigation;
pub mod transport;
pub mod upload;
pub mod wizard;

pub use auth::{AuthContext, AuthProvider};
pub use config::{load_settings, ClientSettings};
pub use error::{ProcessingFailure, UploadError};
pub use transport::{PaperUpload, UploadEventStream, UploadTransport};
pub use upload::{
    drive_upload, pump_events, EventOutcome, FeedItem, IgnoreReason, UploadProgressController,
    UploadSession,
};
pub use wizard::{WizardStep, WizardView};

#[derive(Default)]
struct ClientSession {
    server_url: Option<String>,
    user: Option<UserProfile>,
}

/// HTTP/WebSocket client for the SciLit backend. Holds the signed-in session
/// and implements both collaborator seams the UI talks to.
pub struct ScilitClient {
    http: Client,
    inner: Mutex<ClientSession>,
}

impl ScilitClient {
    pub fn new() -> Arc<Self> {
        Self::with_http_client(Client::new())
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Arc<Self>, UploadError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self::with_http_client(http))
    }

    pub fn with_http_client(http: Client) -> Arc<Self> {
        Arc::new(Self {
            http,
            inner: Mutex::new(ClientSession::default()),
        })
    }

    async fn session(&self) -> Result<(String, UserProfile), UploadError> {
        let guard = self.inner.lock().await;
        let server_url = guard
            .server_url
            .clone()
            .ok_or(UploadError::NotLoggedIn("missing server url"))?;
        let user = guard
            .user
            .clone()
            .ok_or(UploadError::NotLoggedIn("missing user"))?;
        Ok((server_url, user))
    }
}

#[async_trait]
impl AuthProvider for ScilitClient {
    async fn login(&self, server_url: &str, username: &str) -> Result<UserProfile, UploadError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(UploadError::Api(ApiException::new(
                ErrorCode::Validation,
                "username is required",
            )));
        }
        let server_url = server_url.trim().trim_end_matches('/').to_string();

        let response = self
            .http
            .post(transport::endpoint(&server_url, "login"))
            .json(&LoginRequest {
                username: username.to_string(),
            })
            .send()
            .await?;
        let body: LoginResponse = transport::check_response(response).await?.json().await?;

        let profile = UserProfile {
            user_id: UserId(body.user_id),
            name: body.username.unwrap_or_else(|| username.to_string()),
        };
        {
            let mut guard = self.inner.lock().await;
            guard.server_url = Some(server_url);
            guard.user = Some(profile.clone());
        }
        info!(user_id = profile.user_id.0, name = %profile.name, "signed in");
        Ok(profile)
    }

    async fn logout(&self) {
        let mut guard = self.inner.lock().await;
        if let Some(user) = guard.user.take() {
            info!(user_id = user.user_id.0, "signed out");
        }
        guard.server_url = None;
    }

    async fn context(&self) -> AuthContext {
        let guard = self.inner.lock().await;
        match &guard.user {
            Some(user) => AuthContext::signed_in(user.clone()),
            None => AuthContext::anonymous(),
        }
    }
}

#[async_trait]
impl UploadTransport for ScilitClient {
    async fn start_upload(&self, upload: PaperUpload) -> Result<UploadId, UploadError> {
        let (server_url, user) = self.session().await?;
        let size_bytes = upload.bytes.len();

        let response = self
            .http
            .post(transport::endpoint(&server_url, "papers/upload"))
            .query(&[
                ("user_id", user.user_id.0.to_string()),
                ("filename", upload.file_name.clone()),
            ])
            .header(header::CONTENT_TYPE, transport::PDF_MIME_TYPE)
            .body(upload.bytes)
            .send()
            .await?;
        let body: PaperUploadResponse = transport::check_response(response).await?.json().await?;

        info!(
            upload_id = body.upload_id.0,
            file = %upload.file_name,
            size_bytes,
            "paper upload accepted"
        );
        Ok(body.upload_id)
    }

    async fn progress_events(
        &self,
        upload_id: UploadId,
    ) -> Result<UploadEventStream, UploadError> {
        let (server_url, _) = self.session().await?;
        let url = transport::progress_socket_url(&server_url, upload_id)?;
        let (socket, _) = connect_async(url.as_str()).await?;
        debug!(upload_id = upload_id.0, %url, "progress socket connected");

        // The socket is dropped after a terminal event or a receive error.
        let events = stream::unfold(Some(socket), |socket| async move {
            let mut socket = socket?;
            loop {
                match socket.next().await? {
                    Ok(Message::Text(text)) => {
                        let item = serde_json::from_str::<UploadEvent>(&text)
                            .map_err(|err| UploadError::Protocol(err.to_string()));
                        let keep_open = !matches!(&item, Ok(event) if event.is_terminal());
                        return Some((item, keep_open.then_some(socket)));
                    }
                    Ok(Message::Close(_)) => return None,
                    Ok(_) => {}
                    Err(err) => return Some((Err(err.into()), None)),
                }
            }
        });
        Ok(events.boxed())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
