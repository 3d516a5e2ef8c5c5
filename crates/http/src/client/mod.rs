//! Quizdeck API client

pub mod auth;
pub mod config;
pub mod csrf;
pub mod error;
pub mod leaderboard;
pub mod questions;
pub mod social;

use std::sync::Arc;
use std::time::Duration;

use quizdeck_core::SessionEvents;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{ClientBuilder, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

pub use config::ClientConfig;
use csrf::CsrfTokens;
use error::ClientError;

/// Quizdeck API client
///
/// Cloning is cheap; clones share the underlying connection pool, cookie
/// jar, token cache and event bus.
#[derive(Clone)]
pub struct QuizClient {
    client: reqwest::Client,
    base_url: String,
    csrf_header: HeaderName,
    csrf_field: String,
    csrf: CsrfTokens,
    events: SessionEvents,
}

impl QuizClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> QuizClientBuilder {
        QuizClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The CSRF token cache backing this client
    pub fn csrf(&self) -> &CsrfTokens {
        &self.csrf
    }

    /// Session event bus fed by the response interceptor
    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Create a request builder for an API path
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Execute a request through the full pipeline: CSRF attachment on
    /// unsafe verbs, transmission, then token-rotation/expiry inspection of
    /// the response before decoding it as `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let mut request = request.build()?;
        self.attach_csrf(&mut request).await;

        let response = self.client.execute(request).await?;
        self.digest(response).await
    }

    /// Request interceptor: unsafe verbs get the CSRF header, bootstrapping
    /// a token first when none is cached. A failed bootstrap is logged and
    /// the request proceeds bare; the server's 403 then drives the
    /// invalidation path instead of blocking the caller here.
    async fn attach_csrf(&self, request: &mut Request) {
        if !requires_csrf(request.method()) || request.headers().contains_key(&self.csrf_header) {
            return;
        }

        let token = match self.csrf.peek_token() {
            Some(token) => token,
            None => match self.csrf.ensure_token().await {
                Ok(token) => token,
                Err(err) => {
                    warn!(error = %err, "sending unsafe request without CSRF header");
                    return;
                }
            },
        };

        match HeaderValue::from_str(&token) {
            Ok(value) => {
                request.headers_mut().insert(self.csrf_header.clone(), value);
            }
            Err(_) => warn!("cached CSRF token is not a valid header value"),
        }
    }

    /// Response interceptor: absorb token rotations, invalidate the cache on
    /// a token rejection, broadcast session expiry, then map the status.
    async fn digest<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let rotated = extract_token(&body, &self.csrf_field);
        if let Some(token) = rotated.as_deref() {
            debug!("server rotated CSRF token");
            self.csrf.set_token(token);
        }

        if status == StatusCode::FORBIDDEN && rotated.is_none() {
            self.csrf.clear_token();
        }
        if status == StatusCode::UNAUTHORIZED {
            self.events.session_expired();
        }

        if status.is_success() {
            serde_json::from_str(&body).map_err(ClientError::from)
        } else {
            let message = if body.is_empty() {
                status.to_string()
            } else {
                body
            };
            Err(ClientError::from_status(status, message))
        }
    }
}

/// Verbs that must carry the anti-forgery token
fn requires_csrf(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Pull a freshly issued token out of a JSON response body, if any
fn extract_token(body: &str, field: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get(field)
        .and_then(serde_json::Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

/// Builder for [`QuizClient`]
#[derive(Default)]
pub struct QuizClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    csrf_cookie: Option<String>,
    user_agent: Option<String>,
}

impl QuizClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the CSRF cookie name
    pub fn csrf_cookie(mut self, name: impl Into<String>) -> Self {
        self.csrf_cookie = Some(name.into());
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client. Falls back to `QUIZDECK_API_URL`, then the local
    /// development default, when no base URL was given.
    pub fn build(self) -> Result<QuizClient, ClientError> {
        let mut config = ClientConfig::from_env();
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(cookie) = self.csrf_cookie {
            config.csrf_cookie = cookie;
        }

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let origin: Url = base_url
            .parse()
            .map_err(|err| ClientError::Configuration(format!("invalid base URL: {err}")))?;
        let csrf_header = HeaderName::from_bytes(config.csrf_header.as_bytes())
            .map_err(|err| ClientError::Configuration(format!("invalid CSRF header name: {err}")))?;

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("quizdeck-client/{}", env!("CARGO_PKG_VERSION")));

        // One jar shared by the pipeline client and the bootstrap client, so
        // the backend session cookie rides along on every request.
        let jar = Arc::new(Jar::default());
        let client = ClientBuilder::new()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.timeout)
            .user_agent(user_agent)
            .build()?;

        let csrf = CsrfTokens::new(client.clone(), jar, origin, &base_url, &config);

        Ok(QuizClient {
            client,
            base_url,
            csrf_header,
            csrf_field: config.csrf_field,
            csrf,
            events: SessionEvents::new(),
        })
    }
}
