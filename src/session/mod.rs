//! Session module
//!
//! Holds the bearer token and cached user record between runs.
//!
//! # Overview
//!
//! - `Session` - the persisted record (token + user)
//! - `SessionStore` - file-backed persistence with atomic writes
//! - `SessionProvider` - the seam the API client reads tokens through
//! - `LoginRedirect` - invoked after the backend rejects the session

mod provider;
mod redirect;
mod store;
mod types;

pub use provider::{SessionProvider, StaticToken};
pub use redirect::{LogRedirect, LoginRedirect};
pub use store::SessionStore;
pub use types::Session;

#[cfg(test)]
mod tests;
