//! Client configuration

use std::time::Duration;

/// Environment variable overriding the API base address
pub const BASE_URL_ENV: &str = "QUIZDECK_API_URL";

/// Default API base address for local development
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Connection settings and cookie/header naming for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base address, without a trailing slash
    pub base_url: String,
    /// Name of the cookie the backend stores the CSRF token in
    pub csrf_cookie: String,
    /// Header carrying the CSRF token on unsafe requests
    pub csrf_header: String,
    /// JSON body field the backend uses to issue or rotate tokens
    pub csrf_field: String,
    /// Fixed request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            csrf_cookie: "csrftoken".to_owned(),
            csrf_header: "X-CSRFToken".to_owned(),
            csrf_field: "csrfToken".to_owned(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Default configuration with the base address taken from
    /// `QUIZDECK_API_URL` when set and non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.is_empty() {
                config.base_url = base_url;
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_conventions() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.csrf_cookie, "csrftoken");
        assert_eq!(config.csrf_header, "X-CSRFToken");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
