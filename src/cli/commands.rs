//! CLI commands and argument parsing

use crate::models::{ApplicationStatus, StageResult};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Job application tracker CLI
#[derive(Parser, Debug)]
#[command(name = "jobtrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides config file and JOBTRACK_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Client configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Session file (defaults to the user data directory)
    #[arg(short, long, global = true)]
    pub session: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Log every request attempt
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login {
        /// Account email
        email: String,

        /// Password (prompted on stdin when omitted)
        #[arg(long, env = "JOBTRACK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Create an account
    Register {
        /// Account email
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Password (prompted on stdin when omitted)
        #[arg(long, env = "JOBTRACK_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Admin registration code; registers an admin account
        #[arg(long)]
        admin_code: Option<String>,
    },

    /// Manage your applications
    Apps {
        #[command(subcommand)]
        command: AppsCommand,
    },

    /// Upload a stage recording
    Upload {
        #[command(subcommand)]
        stage: UploadCommand,
    },

    /// Admin reporting
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

/// `apps` subcommands
#[derive(Subcommand, Debug)]
pub enum AppsCommand {
    /// List applications
    List {
        /// Only show applications with this status
        #[arg(long)]
        status: Option<ApplicationStatus>,
    },

    /// Show one application
    Show { id: i64 },

    /// Record a new application
    Create {
        /// Company applied to
        company: String,

        /// Job posting URL
        #[arg(long)]
        url: Option<String>,

        /// Date applied (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Change an application
    Update {
        id: i64,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        url: Option<String>,

        /// Date applied (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// waiting, rejected, next_stage or ignored
        #[arg(long)]
        status: Option<ApplicationStatus>,
    },

    /// Delete an application
    Delete { id: i64 },

    /// Daily activity counters
    Activity,

    /// Fetch a stored recording
    Download {
        /// Recording file name, as in a stage's `file_path`
        file: String,

        /// Where to write it (defaults to the file name)
        #[arg(short, long, conflicts_with = "link")]
        output: Option<PathBuf>,

        /// Print a shareable link instead of downloading
        #[arg(long)]
        link: bool,
    },
}

/// `upload` subcommands
#[derive(Subcommand, Debug)]
pub enum UploadCommand {
    /// Screening call recording
    Screening(UploadArgs),
    /// Interview recording
    Interview(UploadArgs),
}

/// Arguments shared by both upload stages
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Application ID
    pub id: i64,

    /// Audio or video file
    pub file: PathBuf,

    /// Date of the stage (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// passed or failed
    #[arg(long)]
    pub result: Option<StageResult>,
}

/// `admin` subcommands
#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Aggregate analytics
    Analytics,

    /// All students
    Students,

    /// Applications across all students
    Applications {
        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        status: Option<ApplicationStatus>,

        /// Only applications untouched for this many days
        #[arg(long)]
        days_stale: Option<u32>,
    },

    /// Daily activity, platform-wide or for one user
    Activity {
        /// User ID
        #[arg(long)]
        user: Option<i64>,
    },

    /// Applications without updates
    Stale {
        /// Days without an update (backend default: 7)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Email reminders for stale applications now
    Notify {
        /// Days without an update (backend default: 7)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Create another admin account
    Register {
        /// Account email
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Password (prompted on stdin when omitted)
        #[arg(long, env = "JOBTRACK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Anonymized platform metrics
    Metrics {
        /// Period in days (backend default: 30)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Backend analytics cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

/// `admin cache` subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Cache statistics
    Stats,

    /// Drop entries whose keys match a pattern
    Invalidate {
        /// SQL LIKE pattern, e.g. `analytics_%`
        pattern: String,
    },

    /// Precompute common entries
    Warm,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON, one document per line
    Json,
    /// Indented JSON
    Pretty,
}
