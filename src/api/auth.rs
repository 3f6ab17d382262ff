//! Authentication endpoints

use crate::error::{Error, Result};
use crate::http::ApiClient;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, User};
use crate::session::SessionStore;
use tracing::{debug, info};

/// `/auth/*` calls plus the local session they maintain
pub struct AuthApi<'a> {
    client: &'a ApiClient,
    store: &'a SessionStore,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient, store: &'a SessionStore) -> Self {
        Self { client, store }
    }

    /// Log in and persist the returned token and user
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response: LoginResponse = self.client.post("/auth/login", &request).await?;
        self.store
            .set(response.token, Some(response.user.clone()))
            .await?;

        info!(user_id = response.user.id, role = ?response.user.role, "Logged in");
        Ok(response.user)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.client.post("/auth/register", request).await
    }

    /// Forget the local session
    ///
    /// The backend issues stateless tokens, so there is nothing to revoke.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await?;
        debug!("Session cleared");
        Ok(())
    }

    /// User cached at login
    pub async fn current_user(&self) -> Result<User> {
        self.store.user().await.ok_or(Error::NotLoggedIn)
    }

    /// Check if a token is stored
    pub async fn is_logged_in(&self) -> bool {
        self.store.token().await.is_some()
    }
}
