//! Session record persisted between runs

use crate::models::User;
use serde::{Deserialize, Serialize};

/// Persisted login state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token issued at login
    #[serde(default)]
    pub token: Option<String>,

    /// User record returned with the token
    #[serde(default)]
    pub user: Option<User>,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for a freshly issued token
    pub fn with_token(token: impl Into<String>, user: Option<User>) -> Self {
        Self {
            token: Some(token.into()),
            user,
        }
    }

    /// Check if a non-empty token is present
    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }

    /// Token to send, ignoring blank values
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}
