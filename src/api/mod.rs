//! Typed job tracker API
//!
//! Thin wrappers that map each backend endpoint onto `ApiClient` calls. All of
//! them inherit the client's retry, session and error handling.
//!
//! # Example
//!
//! ```ignore
//! let tracker = JobTracker::new(ClientConfig::from_env(), SessionStore::from_file(path)?)?;
//! tracker.auth().login("ada@example.edu", "hunter22").await?;
//! for app in tracker.applications().list().await? {
//!     println!("{} ({})", app.company_name, app.status);
//! }
//! ```

mod admin;
mod applications;
mod auth;

pub use admin::AdminApi;
pub use applications::ApplicationsApi;
pub use auth::AuthApi;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::ApiClient;
use crate::session::{LoginRedirect, SessionStore};
use std::sync::Arc;

/// Entry point owning the client and the session it writes to
#[derive(Debug, Clone)]
pub struct JobTracker {
    client: ApiClient,
    store: SessionStore,
}

impl JobTracker {
    /// Build a client that reads and clears `store`
    pub fn new(config: ClientConfig, store: SessionStore) -> Result<Self> {
        let client = ApiClient::new(config, Arc::new(store.clone()))?;
        Ok(Self { client, store })
    }

    /// Assemble from an existing client
    ///
    /// `client` should read its token from `store`, otherwise logins made
    /// through `auth()` will not be seen by later calls.
    pub fn from_parts(client: ApiClient, store: SessionStore) -> Self {
        Self { client, store }
    }

    /// Replace the hook run after the session is rejected
    #[must_use]
    pub fn with_redirect(mut self, redirect: impl LoginRedirect + 'static) -> Self {
        self.client = self.client.with_redirect(redirect);
        self
    }

    /// Underlying request client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Session store
    pub fn session(&self) -> &SessionStore {
        &self.store
    }

    /// Login, registration and session
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(&self.client, &self.store)
    }

    /// The current user's applications
    pub fn applications(&self) -> ApplicationsApi<'_> {
        ApplicationsApi::new(&self.client)
    }

    /// Admin-only reporting
    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(&self.client)
    }
}
