//! Quizdeck HTTP client
//!
//! The authenticated request pipeline for the quiz platform API: a shared
//! [`QuizClient`] that attaches the anti-forgery token to unsafe requests,
//! keeps the token cache consistent with server-issued rotations, and
//! broadcasts session expiry, plus the observable [`Session`] state built on
//! top of it.

pub mod client;
pub mod session;

pub use client::csrf::CsrfTokens;
pub use client::error::ClientError;
pub use client::{ClientConfig, QuizClient, QuizClientBuilder};
pub use session::{AuthStatus, Session};
