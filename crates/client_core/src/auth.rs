use async_trait::async_trait;
use shared::domain::{UserId, UserProfile};

use crate::error::UploadError;

/// Authentication state handed to the view layer on every frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub is_authenticated: bool,
    pub user: Option<UserProfile>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: UserProfile) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .filter(|_| self.is_authenticated)
            .map(|user| user.name.as_str())
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user
            .as_ref()
            .filter(|_| self.is_authenticated)
            .map(|user| user.user_id)
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn login(&self, server_url: &str, username: &str) -> Result<UserProfile, UploadError>;
    async fn logout(&self);
    async fn context(&self) -> AuthContext;
}
