//! CSRF token cache
//!
//! Single source of truth for the anti-forgery token required on unsafe
//! verbs. The cache mirrors the cookie the backend sets, lazily bootstraps a
//! token from the dedicated endpoint when neither is present, and collapses
//! concurrent bootstrap attempts into one request whose outcome every caller
//! shares.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::cookie::{CookieStore, Jar};
use tracing::debug;
use url::Url;

use super::config::ClientConfig;
use super::error::ClientError;

/// Token-issuing endpoint, relative to the API base address
const BOOTSTRAP_PATH: &str = "/csrf/";

type BootstrapFuture = Shared<BoxFuture<'static, Result<String, String>>>;

/// Shared handle to the token cache owned by a client
#[derive(Clone)]
pub struct CsrfTokens {
    inner: Arc<Inner>,
}

struct Inner {
    /// Raw client for the bootstrap fetch; shares the jar with the main
    /// client but bypasses its interception, so bootstrapping can never
    /// recurse into itself.
    http: reqwest::Client,
    jar: Arc<Jar>,
    origin: Url,
    bootstrap_url: String,
    cookie_name: String,
    field_name: String,
    token: Mutex<Option<String>>,
    inflight: Mutex<Option<BootstrapFuture>>,
}

impl CsrfTokens {
    pub(crate) fn new(
        http: reqwest::Client,
        jar: Arc<Jar>,
        origin: Url,
        base_url: &str,
        config: &ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                jar,
                origin,
                bootstrap_url: format!("{base_url}{BOOTSTRAP_PATH}"),
                cookie_name: config.csrf_cookie.clone(),
                field_name: config.csrf_field.clone(),
                token: Mutex::new(None),
                inflight: Mutex::new(None),
            }),
        }
    }

    /// Best-effort synchronous read: the in-memory cache, else the cookie
    /// the backend stored. Never fetches.
    pub fn peek_token(&self) -> Option<String> {
        let cached = self
            .inner
            .token
            .lock()
            .expect("CSRF token lock poisoned")
            .clone();
        cached.or_else(|| cookie_token(&self.inner))
    }

    /// Overwrite the cached token. Empty tokens are ignored.
    pub fn set_token(&self, token: &str) {
        if token.is_empty() {
            return;
        }
        debug!("caching CSRF token");
        *self.inner.token.lock().expect("CSRF token lock poisoned") = Some(token.to_owned());
    }

    /// Drop the cached token, forcing the next [`ensure_token`] to
    /// re-bootstrap.
    ///
    /// [`ensure_token`]: CsrfTokens::ensure_token
    pub fn clear_token(&self) {
        debug!("clearing CSRF token");
        *self.inner.token.lock().expect("CSRF token lock poisoned") = None;
    }

    /// Return a token, bootstrapping one from the server when neither the
    /// cache nor the cookie holds one. Concurrent callers share a single
    /// in-flight fetch and observe the same token or the same failure.
    pub async fn ensure_token(&self) -> Result<String, ClientError> {
        if let Some(token) = self.peek_token() {
            return Ok(token);
        }

        let fetch = self.inflight_fetch();
        let result = fetch.clone().await;
        if let Ok(token) = &result {
            self.set_token(token);
        }
        self.retire(&fetch);

        result.map_err(ClientError::TokenBootstrap)
    }

    /// Join the pending bootstrap fetch, starting one if none is in flight.
    fn inflight_fetch(&self) -> BootstrapFuture {
        let mut inflight = self
            .inner
            .inflight
            .lock()
            .expect("CSRF in-flight lock poisoned");
        if let Some(pending) = inflight.as_ref() {
            return pending.clone();
        }
        let inner = Arc::clone(&self.inner);
        let fetch = async move { bootstrap(&inner).await }.boxed().shared();
        *inflight = Some(fetch.clone());
        fetch
    }

    /// Forget the resolved fetch so a later miss starts a fresh one.
    fn retire(&self, fetch: &BootstrapFuture) {
        let mut inflight = self
            .inner
            .inflight
            .lock()
            .expect("CSRF in-flight lock poisoned");
        if inflight.as_ref().is_some_and(|pending| pending.ptr_eq(fetch)) {
            *inflight = None;
        }
    }
}

/// Fetch a token from the dedicated endpoint. The token comes from the JSON
/// body field or, failing that, from the cookie the response set.
async fn bootstrap(inner: &Inner) -> Result<String, String> {
    debug!(url = %inner.bootstrap_url, "bootstrapping CSRF token");

    let response = inner
        .http
        .get(&inner.bootstrap_url)
        .send()
        .await
        .map_err(|err| format!("token request failed: {err}"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("token endpoint returned {status}"));
    }

    let body = response.text().await.unwrap_or_default();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(token) = value
            .get(&inner.field_name)
            .and_then(serde_json::Value::as_str)
            .filter(|token| !token.is_empty())
        {
            return Ok(token.to_owned());
        }
    }

    cookie_token(inner)
        .ok_or_else(|| "token endpoint yielded neither a body field nor a cookie".to_owned())
}

/// Read the CSRF cookie for the API origin out of the shared jar.
fn cookie_token(inner: &Inner) -> Option<String> {
    let header = inner.jar.cookies(&inner.origin)?;
    let header = header.to_str().ok()?;
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == inner.cookie_name)
        .map(|(_, value)| value.to_owned())
        .filter(|value| !value.is_empty())
}
