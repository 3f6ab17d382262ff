//! Login redirect hook

use tracing::warn;

/// Called once the backend has rejected the session
///
/// Implementations should only navigate or notify; the session has already
/// been cleared when this runs.
pub trait LoginRedirect: Send + Sync {
    /// Send the caller to the login entry point
    fn redirect_to_login(&self, login_path: &str);
}

/// Default hook: logs the login path
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        warn!(login_path, "Session rejected by server, sign in again");
    }
}

impl<F> LoginRedirect for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect_to_login(&self, login_path: &str) {
        self(login_path);
    }
}
