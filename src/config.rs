//! Client configuration
//!
//! Configuration is layered: built-in defaults, then an optional YAML file,
//! then environment overrides. Everything is fixed once the client is built.
//!
//! ```yaml
//! base_url: https://jobs.example.edu/api
//! timeout_ms: 30000
//! max_attempts: 3
//! base_delay_ms: 1000
//! dev_mode: true
//! throttle:
//!   requests_per_second: 5
//!   burst_size: 5
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::http::RateLimiterConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Fallback API origin when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Environment variable holding the API origin
pub const BASE_URL_ENV: &str = "JOBTRACK_API_URL";

/// Environment variable enabling dev-mode diagnostics
pub const DEV_MODE_ENV: &str = "JOBTRACK_DEV";

/// Default upload size limit (500 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

// ============================================================================
// Client Config
// ============================================================================

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API origin all paths are resolved against
    pub base_url: String,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    /// Delay before the first retry, doubled for every further retry
    pub base_delay: Duration,
    /// Optional upper bound for a single backoff delay
    pub max_delay: Option<Duration>,
    /// Use the server's `Retry-After` on 429 instead of the computed delay
    pub respect_retry_after: bool,
    /// Emit per-attempt diagnostics
    pub dev_mode: bool,
    /// Client-side request throttle
    pub throttle: Option<RateLimiterConfig>,
    /// Headers added to every request
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
    /// Largest accepted recording upload
    pub max_upload_bytes: u64,
    /// Where callers are sent after the session is rejected
    pub login_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(30_000),
            max_attempts: 3,
            base_delay: Duration::from_millis(1_000),
            max_delay: None,
            respect_retry_after: false,
            dev_mode: false,
            throttle: None,
            default_headers: HashMap::new(),
            user_agent: format!("jobtrack-client/{}", env!("CARGO_PKG_VERSION")),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            login_path: "/login".to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Parse a YAML config file on top of the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse YAML config text on top of the defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        let mut config = Self::default();
        config.apply_file(file);
        Ok(config)
    }

    /// Overlay values present in a config file
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(ms) = file.timeout_ms {
            self.timeout = Duration::from_millis(ms);
        }
        if let Some(attempts) = file.max_attempts {
            self.max_attempts = attempts;
        }
        if let Some(ms) = file.base_delay_ms {
            self.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file.max_delay_ms {
            self.max_delay = Some(Duration::from_millis(ms));
        }
        if let Some(flag) = file.respect_retry_after {
            self.respect_retry_after = flag;
        }
        if let Some(flag) = file.dev_mode {
            self.dev_mode = flag;
        }
        if file.throttle.is_some() {
            self.throttle = file.throttle;
        }
        self.default_headers.extend(file.headers);
        if let Some(agent) = file.user_agent {
            self.user_agent = agent;
        }
        if let Some(mb) = file.max_upload_mb {
            self.max_upload_bytes = mb.saturating_mul(1024 * 1024);
        }
        if let Some(path) = file.login_path {
            self.login_path = path;
        }
    }

    /// Overlay environment variables, read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(flag) = lookup(DEV_MODE_ENV) {
            self.dev_mode = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }

    /// Check the config is usable
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.max_attempts == 0 {
            return Err(Error::invalid_value("max_attempts", "must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(Error::invalid_value("timeout", "must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for client config
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set total attempts per call
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set the first retry delay
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    /// Cap every backoff delay at `delay`
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = Some(delay);
        self
    }

    /// Honor `Retry-After` on 429 responses
    pub fn respect_retry_after(mut self, flag: bool) -> Self {
        self.config.respect_retry_after = flag;
        self
    }

    /// Enable dev-mode diagnostics
    pub fn dev_mode(mut self, flag: bool) -> Self {
        self.config.dev_mode = flag;
        self
    }

    /// Throttle outgoing requests
    pub fn throttle(mut self, config: RateLimiterConfig) -> Self {
        self.config.throttle = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set the upload size limit in bytes
    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    /// Set the login entry point
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.config.login_path = path.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

// ============================================================================
// File Format
// ============================================================================

/// On-disk config file; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub base_delay_ms: Option<u64>,
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
    #[serde(default)]
    pub respect_retry_after: Option<bool>,
    #[serde(default)]
    pub dev_mode: Option<bool>,
    #[serde(default)]
    pub throttle: Option<RateLimiterConfig>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub max_upload_mb: Option<u64>,
    #[serde(default)]
    pub login_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay, Duration::from_millis(1_000));
        assert!(!config.dev_mode);
        assert!(!config.respect_retry_after);
        assert!(config.max_delay.is_none());
        assert!(config.throttle.is_none());
        assert_eq!(config.max_upload_bytes, 500 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::builder()
            .base_url("https://jobs.example.edu")
            .timeout(Duration::from_secs(5))
            .max_attempts(5)
            .base_delay(Duration::from_millis(200))
            .max_delay(Duration::from_secs(2))
            .dev_mode(true)
            .header("X-Client", "cli")
            .user_agent("test-agent/1.0")
            .login_path("/signin")
            .build();

        assert_eq!(config.base_url, "https://jobs.example.edu");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_delay, Duration::from_millis(200));
        assert_eq!(config.max_delay, Some(Duration::from_secs(2)));
        assert!(config.dev_mode);
        assert_eq!(
            config.default_headers.get("X-Client"),
            Some(&"cli".to_string())
        );
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert_eq!(config.login_path, "/signin");
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r"
base_url: https://api.example.com
timeout_ms: 5000
max_attempts: 4
base_delay_ms: 250
dev_mode: true
respect_retry_after: true
max_upload_mb: 10
throttle:
  requests_per_second: 2
  burst_size: 4
headers:
  X-Campus: north
";
        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.base_delay, Duration::from_millis(250));
        assert!(config.dev_mode);
        assert!(config.respect_retry_after);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        let throttle = config.throttle.unwrap();
        assert_eq!(throttle.requests_per_second, 2);
        assert_eq!(throttle.burst_size, 4);
        assert_eq!(
            config.default_headers.get("X-Campus"),
            Some(&"north".to_string())
        );
        // untouched fields keep their defaults
        assert_eq!(config.max_delay, None);
    }

    #[test]
    fn test_config_yaml_max_delay() {
        let config = ClientConfig::from_yaml_str("max_delay_ms: 5000\n").unwrap();
        assert_eq!(config.max_delay, Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_config_yaml_unknown_field() {
        let result = ClientConfig::from_yaml_str("retries: 3\n");
        assert!(matches!(result, Err(Error::YamlParse(_))));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: http://127.0.0.1:9000").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_config_file_error_names_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "retries: 3").unwrap();

        let err = ClientConfig::from_file(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Invalid config file"));
        assert!(message.contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_config_from_missing_file() {
        let result = ClientConfig::from_file("/nonexistent/jobtrack.yaml");
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_config_env_overrides() {
        let mut config = ClientConfig::default();
        config.apply_env(|key| match key {
            BASE_URL_ENV => Some(" https://prod.example.com ".to_string()),
            DEV_MODE_ENV => Some("true".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "https://prod.example.com");
        assert!(config.dev_mode);

        config.apply_env(|key| (key == DEV_MODE_ENV).then(|| "0".to_string()));
        assert!(!config.dev_mode);
        assert_eq!(config.base_url, "https://prod.example.com");
    }

    #[test]
    fn test_config_env_empty_url_ignored() {
        let mut config = ClientConfig::default();
        config.apply_env(|key| (key == BASE_URL_ENV).then(String::new));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_config_validate() {
        let bad_url = ClientConfig::builder().base_url("not a url").build();
        assert!(matches!(bad_url.validate(), Err(Error::InvalidUrl(_))));

        let bad_scheme = ClientConfig::builder().base_url("ftp://example.com").build();
        assert!(matches!(
            bad_scheme.validate(),
            Err(Error::InvalidConfigValue { .. })
        ));

        let no_attempts = ClientConfig::builder().max_attempts(0).build();
        assert!(no_attempts.validate().is_err());

        let no_timeout = ClientConfig::builder().timeout(Duration::ZERO).build();
        assert!(no_timeout.validate().is_err());
    }
}
