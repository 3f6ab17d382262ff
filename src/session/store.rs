//! Session store implementation
//!
//! Provides file-based session persistence with atomic writes.

use super::types::Session;
use crate::error::{Error, Result};
use crate::models::User;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const APP_DIR: &str = "jobtrack";
const SESSION_FILE: &str = "session.json";

/// Distinguishes temp files of saves running at the same time
static SAVE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Session store for persisting and loading the login session
#[derive(Debug)]
pub struct SessionStore {
    /// Path to the session file
    path: PathBuf,
    /// Current session (cached)
    session: Arc<RwLock<Session>>,
}

impl SessionStore {
    /// Create a store backed by `path` without reading it
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            session: Arc::new(RwLock::new(Session::new())),
        }
    }

    /// Create an in-memory store (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            session: Arc::new(RwLock::new(Session::new())),
        }
    }

    /// Create an in-memory store holding `session`
    pub fn with_session(session: Session) -> Self {
        Self {
            path: PathBuf::new(),
            session: Arc::new(RwLock::new(session)),
        }
    }

    /// Create a store from a file, loading the existing session if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let session = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::session(format!("Failed to read session file: {e}")))?;
            parse_session(&contents)?
        } else {
            Session::new()
        };

        Ok(Self {
            path,
            session: Arc::new(RwLock::new(session)),
        })
    }

    /// Platform location of the session file
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut home| {
                    home.push(".local");
                    home.push("share");
                    home
                })
            })
            .ok_or_else(|| Error::session("Could not resolve a data directory"))?;
        Ok(base.join(APP_DIR).join(SESSION_FILE))
    }

    /// Reload the session from file
    pub async fn load(&self) -> Result<()> {
        if self.is_in_memory() || !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::session(format!("Failed to read session file: {e}")))?;
        let loaded = parse_session(&contents)?;

        let mut session = self.session.write().await;
        *session = loaded;

        Ok(())
    }

    /// Save the current session to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = {
            let session = self.session.read().await;
            serde_json::to_string_pretty(&*session)
                .map_err(|e| Error::session(format!("Failed to serialize session: {e}")))?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::session(format!("Failed to create session dir: {e}")))?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::session(format!("Failed to write session file: {e}")))?;
        restrict_permissions(&temp_path).await?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::session(format!("Failed to rename session file: {e}")))?;

        Ok(())
    }

    /// Snapshot of the current session
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Current bearer token
    pub async fn token(&self) -> Option<String> {
        self.session.read().await.bearer().map(ToString::to_string)
    }

    /// Cached user record
    pub async fn user(&self) -> Option<User> {
        self.session.read().await.user.clone()
    }

    /// Store a new token and user, then persist
    pub async fn set(&self, token: impl Into<String>, user: Option<User>) -> Result<()> {
        {
            let mut session = self.session.write().await;
            *session = Session::with_token(token, user);
        }
        self.save().await
    }

    /// Forget token and user, removing the session file
    ///
    /// Idempotent: clearing an already empty store succeeds.
    pub async fn clear(&self) -> Result<()> {
        {
            let mut session = self.session.write().await;
            *session = Session::new();
        }

        if self.is_in_memory() {
            return Ok(());
        }

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::session(format!("Failed to remove session file: {e}"))),
        }
    }

    /// Temp file next to the session file, unique per save
    fn temp_path(&self) -> PathBuf {
        let seq = SAVE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.{seq}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    /// Get the session file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            session: Arc::clone(&self.session),
        }
    }
}

fn parse_session(contents: &str) -> Result<Session> {
    if contents.trim().is_empty() {
        return Ok(Session::new());
    }
    serde_json::from_str(contents)
        .map_err(|e| Error::session(format!("Failed to parse session file: {e}")))
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .map_err(|e| Error::session(format!("Failed to set session file permissions: {e}")))
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
