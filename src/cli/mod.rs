//! CLI module
//!
//! Command-line interface for the job tracker.
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` / `register` - Session management
//! - `apps` - List, show, create, update and delete applications, fetch recordings
//! - `upload` - Attach screening or interview recordings
//! - `admin` - Analytics, cross-student reporting and backend maintenance

mod commands;
mod runner;

pub use commands::{
    AdminCommand, AppsCommand, CacheCommand, Cli, Commands, OutputFormat, UploadArgs,
    UploadCommand,
};
pub use runner::{CliRedirect, Runner};
