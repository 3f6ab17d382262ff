//! Session providers
//!
//! The API client never reads session storage directly. It asks a
//! `SessionProvider` for the token at call time and tells it to forget the
//! session when the backend answers 401.

use super::store::SessionStore;
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Source of the bearer token for outgoing calls
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Token to attach, if any
    async fn token(&self) -> Option<String>;

    /// Drop the token and cached user. Must be idempotent.
    async fn invalidate(&self) -> Result<()>;
}

#[async_trait]
impl SessionProvider for SessionStore {
    async fn token(&self) -> Option<String> {
        SessionStore::token(self).await
    }

    async fn invalidate(&self) -> Result<()> {
        self.clear().await
    }
}

/// Fixed token, e.g. from an environment variable
#[derive(Debug, Default)]
pub struct StaticToken {
    token: RwLock<Option<String>>,
}

impl StaticToken {
    /// Provider that always sends `token` until invalidated
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Provider that never sends a token
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    async fn invalidate(&self) -> Result<()> {
        *self.token.write().await = None;
        Ok(())
    }
}
