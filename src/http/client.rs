//! API client with session handling and retry
//!
//! Handles:
//! - Bearer token injection from the session provider
//! - Automatic retries with exponential backoff
//! - Session invalidation and login redirect on 401
//! - Normalization of every failure into an `ApiError`

use super::rate_limit::RateLimiter;
use super::request::{ApiRequest, RequestBody};
use super::retry::{parse_retry_after, RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
use crate::config::ClientConfig;
use crate::error::{ApiError, Error, ErrorKind, Result};
use crate::session::{LogRedirect, LoginRedirect, SessionProvider, StaticToken};
use crate::types::{JsonValue, Method};
use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Failed attempt plus the server's retry hint, if any
struct AttemptFailure {
    error: ApiError,
    retry_after: Option<Duration>,
}

/// Resilient client for the job tracker API
///
/// Cheap to clone; clones share the connection pool, session provider and
/// throttle.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Arc<ClientConfig>,
    policy: RetryPolicy,
    session: Arc<dyn SessionProvider>,
    redirect: Arc<dyn LoginRedirect>,
    sleeper: Arc<dyn Sleeper>,
    rate_limiter: Option<RateLimiter>,
}

impl ApiClient {
    /// Create a client reading tokens from `session`
    pub fn new(config: ClientConfig, session: Arc<dyn SessionProvider>) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.throttle.as_ref().map(RateLimiter::new);
        let policy = RetryPolicy::from_config(&config);

        Ok(Self {
            client,
            config: Arc::new(config),
            policy,
            session,
            redirect: Arc::new(LogRedirect),
            sleeper: Arc::new(TokioSleeper),
            rate_limiter,
        })
    }

    /// Create a client that never sends a token
    pub fn anonymous(config: ClientConfig) -> Result<Self> {
        Self::new(config, Arc::new(StaticToken::anonymous()))
    }

    /// Replace the hook run after the session is rejected
    #[must_use]
    pub fn with_redirect(mut self, redirect: impl LoginRedirect + 'static) -> Self {
        self.redirect = Arc::new(redirect);
        self
    }

    /// Replace how backoff delays are waited out
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Retry policy in effect
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Session provider tokens are read from
    pub fn session(&self) -> &Arc<dyn SessionProvider> {
        &self.session
    }

    /// Check if client-side throttling is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Issue a call and decode the response body
    ///
    /// An empty success body decodes as JSON `null`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
        params: Option<&[(&str, &str)]>,
    ) -> Result<T> {
        let mut request = ApiRequest::new(method, path);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(params) = params {
            request = request.queries(params.iter().copied());
        }
        self.execute(request).await
    }

    /// GET and decode
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, None, None).await
    }

    /// POST a JSON body and decode
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, Some(body), None).await
    }

    /// PUT a JSON body and decode
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.send(Method::PUT, path, Some(body), None).await
    }

    /// DELETE and decode
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::DELETE, path, None, None).await
    }

    /// Run a request through the retry loop and decode the JSON body
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let (status, body, attempts) = self.run(&request).await?;
        decode_body(status, &body).map_err(|e| Error::Api(e.with_attempts(attempts)))
    }

    /// Run a request through the retry loop and return the raw body
    pub async fn execute_bytes(&self, request: ApiRequest) -> Result<Bytes> {
        let (_, body, _) = self.run(&request).await?;
        Ok(body)
    }

    /// Retry loop shared by every call; yields status, body and attempt count
    async fn run(&self, request: &ApiRequest) -> Result<(u16, Bytes, u32)> {
        let url = self.build_url(&request.path)?;
        let token = self.session.token().await;
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;

            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            if self.config.dev_mode {
                info!(
                    method = %request.method,
                    url = %url,
                    attempt,
                    max_attempts,
                    authenticated = token.is_some(),
                    "API request"
                );
            }

            let builder = self.build_request(request, &url, token.as_deref())?;
            let failure = match self.attempt(builder).await {
                Ok((status, body)) => {
                    if self.config.dev_mode {
                        info!(
                            method = %request.method,
                            url = %url,
                            status,
                            attempt,
                            bytes = body.len(),
                            "API response"
                        );
                    }
                    return Ok((status, body, attempt));
                }
                Err(failure) => failure,
            };

            let error = failure.error.with_attempts(attempt);

            if error.kind == ErrorKind::Unauthorized {
                self.handle_unauthorized(request, &url).await;
                return Err(Error::Api(error));
            }

            match self.policy.decide(attempt, &error, failure.retry_after) {
                RetryDecision::Retry(delay) => {
                    if self.config.dev_mode {
                        warn!(
                            method = %request.method,
                            url = %url,
                            status = ?error.status,
                            kind = ?error.kind,
                            attempt,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %error.message,
                            "API request failed, retrying"
                        );
                    }
                    self.sleeper.sleep(delay).await;
                }
                RetryDecision::Fail => {
                    if self.config.dev_mode {
                        warn!(
                            method = %request.method,
                            url = %url,
                            status = ?error.status,
                            kind = ?error.kind,
                            attempt,
                            error = %error.message,
                            "API request failed"
                        );
                    }
                    return Err(Error::Api(error));
                }
            }
        }
    }

    /// Send one attempt, reading the full body
    async fn attempt(
        &self,
        builder: RequestBuilder,
    ) -> std::result::Result<(u16, Bytes), AttemptFailure> {
        let response = builder.send().await.map_err(|e| AttemptFailure {
            error: ApiError::from_transport(&e),
            retry_after: None,
        })?;

        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await.map_err(|e| AttemptFailure {
                error: ApiError::from_transport(&e),
                retry_after: None,
            })?;
            return Ok((status.as_u16(), body));
        }

        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        Err(AttemptFailure {
            error: ApiError::from_response(status.as_u16(), &body),
            retry_after,
        })
    }

    /// Build the reqwest request for one attempt
    fn build_request(
        &self,
        request: &ApiRequest,
        url: &Url,
        token: Option<&str>,
    ) -> Result<RequestBuilder> {
        let mut req = self
            .client
            .request(request.method.into(), url.clone())
            .timeout(request.timeout.unwrap_or(self.config.timeout));

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        req = match &request.body {
            RequestBody::Empty => req,
            RequestBody::Json(body) => req.json(body),
            RequestBody::Upload(upload) => req.multipart(upload.to_form()?),
        };

        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        Ok(req)
    }

    /// Clear the session and send the caller to the login entry point
    async fn handle_unauthorized(&self, request: &ApiRequest, url: &Url) {
        if self.config.dev_mode {
            warn!(
                method = %request.method,
                url = %url,
                "Session rejected (401), clearing session"
            );
        }

        if let Err(e) = self.session.invalidate().await {
            warn!(error = %e, "Failed to clear rejected session");
        }

        self.redirect.redirect_to_login(&self.config.login_path);
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Decode a success body; empty bodies decode as `null`
fn decode_body<T: DeserializeOwned>(
    status: u16,
    body: &[u8],
) -> std::result::Result<T, ApiError> {
    let decoded = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(JsonValue::Null)
    } else {
        serde_json::from_slice(body)
    };

    decoded.map_err(|e| ApiError::decode(status, format!("Failed to decode response: {e}")))
}
