//! Authentication and session endpoints

use quizdeck_core::{AuthResponse, LoginRequest, RegisterRequest, User};
use reqwest::Method;

use super::{ClientError, QuizClient};

impl QuizClient {
    /// Warm the CSRF token cache ahead of the first unsafe request
    pub async fn fetch_csrf_token(&self) -> Result<String, ClientError> {
        self.csrf().ensure_token().await
    }

    /// Fetch the current user from the session probe endpoint
    pub async fn me(&self) -> Result<User, ClientError> {
        let request = self.request(Method::GET, "/me/");
        self.execute(request).await
    }

    /// Log in with email and password
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let request = self
            .request(Method::POST, "/auth/login/")
            .json(credentials);
        self.execute(request).await
    }

    /// Register a new account
    pub async fn register(
        &self,
        registration: &RegisterRequest,
    ) -> Result<AuthResponse, ClientError> {
        let request = self
            .request(Method::POST, "/auth/register/")
            .json(registration);
        self.execute(request).await
    }

    /// End the current session
    pub async fn logout(&self) -> Result<AuthResponse, ClientError> {
        let request = self.request(Method::POST, "/auth/logout/");
        self.execute(request).await
    }
}
