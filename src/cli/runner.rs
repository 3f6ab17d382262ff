//! CLI runner - executes commands

use crate::api::JobTracker;
use crate::cli::commands::{
    AdminCommand, AppsCommand, CacheCommand, Cli, Commands, OutputFormat, UploadArgs,
    UploadCommand,
};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{
    ApplicationFilter, ApplicationUpdate, NewApplication, RegisterRequest, Stage,
};
use crate::session::{LoginRedirect, SessionStore};
use crate::upload::Recording;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

/// Tells the user to log in again after the backend rejects the session
#[derive(Debug, Clone, Copy, Default)]
pub struct CliRedirect;

impl LoginRedirect for CliRedirect {
    fn redirect_to_login(&self, _login_path: &str) {
        eprintln!("Session expired or invalid. Run `jobtrack login <email>` to sign in again.");
    }
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let tracker = self.tracker()?;

        match &self.cli.command {
            Commands::Login { email, password } => {
                self.login(&tracker, email, password.as_deref()).await
            }
            Commands::Logout => {
                tracker.auth().logout().await?;
                eprintln!("Logged out");
                Ok(())
            }
            Commands::Whoami => {
                let user = tracker.auth().current_user().await?;
                self.output(&user)
            }
            Commands::Register {
                email,
                first_name,
                last_name,
                password,
                admin_code,
            } => {
                let password = match password {
                    Some(password) => password.clone(),
                    None => prompt_password().await?,
                };
                let request = RegisterRequest {
                    email: email.clone(),
                    password,
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    admin_code: admin_code.clone(),
                    ..Default::default()
                };
                let user = tracker.auth().register(&request).await?;
                self.output(&user)
            }
            Commands::Apps { command } => self.apps(&tracker, command).await,
            Commands::Upload { stage } => match stage {
                UploadCommand::Screening(args) => {
                    self.upload(&tracker, Stage::Screening, args).await
                }
                UploadCommand::Interview(args) => {
                    self.upload(&tracker, Stage::Interview, args).await
                }
            },
            Commands::Admin { command } => self.admin(&tracker, command).await,
        }
    }

    /// Resolve client config: defaults, then file, then environment, then flags
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());

        if let Some(url) = &self.cli.api_url {
            config.base_url.clone_from(url);
        }
        if self.cli.verbose {
            config.dev_mode = true;
        }

        Ok(config)
    }

    /// Load the session store
    fn session_store(&self) -> Result<SessionStore> {
        let path = match &self.cli.session {
            Some(path) => path.clone(),
            None => SessionStore::default_path()?,
        };
        debug!(path = %path.display(), "Using session file");
        SessionStore::from_file(path)
    }

    fn tracker(&self) -> Result<JobTracker> {
        let config = self.client_config()?;
        let store = self.session_store()?;
        let tracker = JobTracker::new(config, store)?;

        if self.uses_session() {
            Ok(tracker.with_redirect(CliRedirect))
        } else {
            // a 401 here means bad credentials, not an expired session
            Ok(tracker.with_redirect(|_: &str| {}))
        }
    }

    /// Whether the command runs on a stored session
    fn uses_session(&self) -> bool {
        !matches!(
            self.cli.command,
            Commands::Login { .. } | Commands::Register { .. }
        )
    }

    async fn login(&self, tracker: &JobTracker, email: &str, password: Option<&str>) -> Result<()> {
        let password = match password {
            Some(password) => password.to_string(),
            None => prompt_password().await?,
        };

        let user = tracker.auth().login(email, &password).await?;
        eprintln!("Logged in as {} ({})", user.full_name(), user.email);
        Ok(())
    }

    async fn apps(&self, tracker: &JobTracker, command: &AppsCommand) -> Result<()> {
        let apps = tracker.applications();

        match command {
            AppsCommand::List { status } => {
                let mut list = apps.list().await?;
                if let Some(status) = status {
                    list.retain(|app| app.status == *status);
                }
                self.output(&list)
            }
            AppsCommand::Show { id } => self.output(&apps.get(*id).await?),
            AppsCommand::Create { company, url, date } => {
                let application = NewApplication {
                    company_name: company.clone(),
                    job_url: url.clone(),
                    application_date: date.unwrap_or_else(today),
                };
                self.output(&apps.create(&application).await?)
            }
            AppsCommand::Update {
                id,
                company,
                url,
                date,
                status,
            } => {
                let changes = ApplicationUpdate {
                    company_name: company.clone(),
                    job_url: url.clone(),
                    application_date: *date,
                    status: *status,
                };
                if changes.is_empty() {
                    return Err(Error::Other(
                        "Nothing to update: pass --company, --url, --date or --status".into(),
                    ));
                }
                self.output(&apps.update(*id, &changes).await?)
            }
            AppsCommand::Delete { id } => {
                apps.delete(*id).await?;
                eprintln!("Deleted application {id}");
                Ok(())
            }
            AppsCommand::Activity => self.output(&apps.activity().await?),
            AppsCommand::Download { file, link: true, .. } => {
                println!("{}", apps.download_link(file).await?);
                Ok(())
            }
            AppsCommand::Download { file, output, .. } => {
                let dest = output.clone().unwrap_or_else(|| PathBuf::from(file));
                let bytes = apps.download_recording(file, &dest).await?;
                eprintln!("Saved {bytes} bytes to {}", dest.display());
                Ok(())
            }
        }
    }

    async fn upload(&self, tracker: &JobTracker, stage: Stage, args: &UploadArgs) -> Result<()> {
        let max_bytes = tracker.client().config().max_upload_bytes;
        let recording = Recording::from_path(&args.file, max_bytes).await?;
        debug!(
            stage = %stage,
            file = recording.file_name(),
            mime = recording.mime_type(),
            bytes = recording.len(),
            "Uploading recording"
        );

        let record = tracker
            .applications()
            .upload(args.id, stage, recording, args.date, args.result)
            .await?;
        self.output(&record)
    }

    async fn admin(&self, tracker: &JobTracker, command: &AdminCommand) -> Result<()> {
        let admin = tracker.admin();

        match command {
            AdminCommand::Analytics => self.output(&admin.analytics().await?),
            AdminCommand::Students => self.output(&admin.students().await?),
            AdminCommand::Applications {
                company,
                status,
                days_stale,
            } => {
                let filter = ApplicationFilter {
                    company: company.clone(),
                    status: *status,
                    days_stale: *days_stale,
                };
                self.output(&admin.applications(&filter).await?)
            }
            AdminCommand::Activity { user: Some(user_id) } => {
                self.output(&admin.user_activity(*user_id).await?)
            }
            AdminCommand::Activity { user: None } => self.output(&admin.activity().await?),
            AdminCommand::Stale { days } => self.output(&admin.stale_applications(*days).await?),
            AdminCommand::Notify { days } => {
                self.output(&admin.trigger_notifications(*days).await?)
            }
            AdminCommand::Register {
                email,
                first_name,
                last_name,
                password,
            } => {
                let password = match password {
                    Some(password) => password.clone(),
                    None => prompt_password().await?,
                };
                let request = RegisterRequest {
                    email: email.clone(),
                    password,
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    ..Default::default()
                };
                self.output(&admin.register_admin(&request).await?)
            }
            AdminCommand::Metrics { days } => self.output(&admin.metrics(*days).await?),
            AdminCommand::Cache { command } => match command {
                CacheCommand::Stats => self.output(&admin.cache_stats().await?),
                CacheCommand::Invalidate { pattern } => {
                    self.output(&admin.invalidate_cache(pattern).await?)
                }
                CacheCommand::Warm => self.output(&admin.warm_cache().await?),
            },
        }
    }

    /// Print a response in the selected format
    fn output<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{text}");
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Read a password line from stdin
async fn prompt_password() -> Result<String> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(b"Password: ").await?;
    stderr.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(Error::Other("Password must not be empty".into()));
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::time::Duration;

    fn runner(args: &[&str]) -> Runner {
        Runner::new(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("client.yaml");
        std::fs::write(
            &config_path,
            "base_url: http://file.example\nmax_attempts: 5\ntimeout_ms: 1500\n",
        )
        .unwrap();

        let runner = runner(&[
            "jobtrack",
            "--config",
            config_path.to_str().unwrap(),
            "--api-url",
            "http://flag.example",
            "--verbose",
            "whoami",
        ]);
        let config = runner.client_config().unwrap();

        assert_eq!(config.base_url, "http://flag.example");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert!(config.dev_mode);
    }

    #[test]
    fn test_missing_config_file() {
        let runner = runner(&["jobtrack", "--config", "/nonexistent/client.yaml", "logout"]);
        assert!(matches!(
            runner.client_config(),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_whoami_without_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        let runner = runner(&[
            "jobtrack",
            "--session",
            session.to_str().unwrap(),
            "--api-url",
            "http://127.0.0.1:9",
            "whoami",
        ]);

        assert!(matches!(runner.run().await, Err(Error::NotLoggedIn)));
    }

    #[tokio::test]
    async fn test_update_requires_changes() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        let runner = runner(&[
            "jobtrack",
            "--session",
            session.to_str().unwrap(),
            "--api-url",
            "http://127.0.0.1:9",
            "apps",
            "update",
            "3",
        ]);

        let err = runner.run().await.unwrap_err();
        assert!(err.to_string().starts_with("Nothing to update"));
    }

    #[test]
    fn test_login_hint_only_for_session_commands() {
        assert!(!runner(&["jobtrack", "login", "ada@example.edu"]).uses_session());
        assert!(!runner(&[
            "jobtrack",
            "register",
            "ada@example.edu",
            "--first-name",
            "Ada",
            "--last-name",
            "Lovelace",
        ])
        .uses_session());
        assert!(runner(&["jobtrack", "apps", "list"]).uses_session());
        assert!(runner(&[
            "jobtrack",
            "admin",
            "register",
            "grace@example.edu",
            "--first-name",
            "Grace",
            "--last-name",
            "Hopper",
        ])
        .uses_session());
    }

    #[tokio::test]
    async fn test_failed_login_reports_bad_credentials() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::path("/auth/login"))
            .respond_with(wiremock::ResponseTemplate::new(401).set_body_json(
                serde_json::json!({"error": "UNAUTHORIZED", "message": "Invalid credentials"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        let uri = server.uri();
        let runner = runner(&[
            "jobtrack",
            "--session",
            session.to_str().unwrap(),
            "--api-url",
            &uri,
            "login",
            "ada@example.edu",
            "--password",
            "wrong",
        ]);

        let err = runner.run().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "HTTP 401: Invalid credentials");
    }

    #[tokio::test]
    async fn test_register_sends_admin_code_without_role() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::path("/auth/register"))
            .and(wiremock::matchers::body_json(serde_json::json!({
                "email": "ada@example.edu",
                "password": "secret1",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "admin_code": "letmein"
            })))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 3,
                "email": "ada@example.edu",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "role": "admin",
                "created_at": "2024-03-01T09:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        let uri = server.uri();
        let runner = runner(&[
            "jobtrack",
            "--session",
            session.to_str().unwrap(),
            "--api-url",
            &uri,
            "register",
            "ada@example.edu",
            "--first-name",
            "Ada",
            "--last-name",
            "Lovelace",
            "--password",
            "secret1",
            "--admin-code",
            "letmein",
        ]);

        runner.run().await.unwrap();
    }

    #[tokio::test]
    async fn test_download_rejects_path_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        let runner = runner(&[
            "jobtrack",
            "--session",
            session.to_str().unwrap(),
            "--api-url",
            "http://127.0.0.1:9",
            "apps",
            "download",
            "../secret.mp3",
        ]);

        assert!(matches!(
            runner.run().await,
            Err(Error::InvalidFileName { .. })
        ));
    }

    #[tokio::test]
    async fn test_upload_validates_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "not a recording").unwrap();

        let runner = runner(&[
            "jobtrack",
            "--session",
            session.to_str().unwrap(),
            "--api-url",
            "http://127.0.0.1:9",
            "upload",
            "screening",
            "3",
            notes.to_str().unwrap(),
        ]);

        assert!(matches!(runner.run().await, Err(Error::Upload { .. })));
    }
}
