//! Auth endpoints. Both go through the same client as every other call, so a
//! `401` from either one tears the session down too.

use crate::{
    api::{client::ApiClient, errors::ApiError},
    session::types::{LoginCredentials, LoginGrant, UserProfile},
};
use tracing::instrument;

pub const LOGIN_PATH: &str = "auth/login";
pub const ME_PATH: &str = "/auth/me";

impl ApiClient {
    /// Exchanges credentials for a fresh token and profile.
    /// The request body carries the password and must never be logged.
    ///
    /// # Errors
    /// Returns the server's rejection or a transport failure.
    #[instrument(skip_all)]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, ApiError> {
        self.post(LOGIN_PATH, credentials).await
    }

    /// Asks the server who the current credential belongs to.
    ///
    /// # Errors
    /// Returns [`ApiError::Unauthorized`] when the credential is missing or stale.
    #[instrument(skip_all)]
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        self.get(ME_PATH).await
    }
}
