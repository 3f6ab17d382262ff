// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Job Tracker Client
//!
//! Resilient API client and CLI for the job application tracker backend.
//!
//! ## Features
//!
//! - **Bearer Sessions**: Token read from the session store before every call
//! - **Automatic Retries**: Exponential backoff on network faults, timeouts, 408, 429 and 5xx
//! - **Session Expiry**: Any 401 clears the stored session and triggers the login redirect
//! - **Normalized Errors**: Every failure becomes an `ApiError` with message, status, code and details
//! - **Recording Uploads**: Validated multipart uploads that retry like any other call
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jobtrack_client::{ClientConfig, JobTracker, Result, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = SessionStore::from_file(SessionStore::default_path()?)?;
//!     let tracker = JobTracker::new(ClientConfig::from_env(), store)?;
//!
//!     tracker.auth().login("ada@example.edu", "secret").await?;
//!
//!     for app in tracker.applications().list().await? {
//!         println!("{} - {}", app.company_name, app.status);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         JobTracker                              │
//! │     auth() → AuthApi   applications() → ApplicationsApi         │
//! │     admin() → AdminApi                                          │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──────────────┬───────────────────┐
//! │   Session    │          ApiClient           │      Upload       │
//! ├──────────────┼──────────────────────────────┼───────────────────┤
//! │ SessionStore │ Bearer token    RetryPolicy  │ Recording         │
//! │ Provider     │ 401 → clear     Backoff      │ Multipart form    │
//! │ Redirect     │ ApiError        Throttle     │ Type/size checks  │
//! └──────────────┴──────────────────────────────┴───────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types and the normalized API error descriptor
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration
pub mod config;

/// Backend wire types
pub mod models;

/// Session persistence and the login redirect hook
pub mod session;

/// HTTP client with retry and rate limiting
pub mod http;

/// Recording upload validation and multipart bodies
pub mod upload;

/// Typed endpoint wrappers
pub mod api;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{ApiError, Error, ErrorKind, Result};
pub use types::*;

// Re-export commonly used types
pub use api::{AdminApi, ApplicationsApi, AuthApi, JobTracker};
pub use config::ClientConfig;
pub use http::{ApiClient, ApiRequest, RetryPolicy};
pub use session::{LoginRedirect, Session, SessionProvider, SessionStore, StaticToken};
pub use upload::{Recording, StageUpload};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
