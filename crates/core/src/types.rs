use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl User {
    /// Check if the user holds the admin role
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Credentials for `POST /auth/login/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload for `POST /auth/register/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Common envelope returned by the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub ok: bool,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default, rename = "csrfToken", skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

/// A full question as served by `GET /questions/{id}/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub choices: Vec<Choice>,
    pub author: User,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub attempts: i64,
}

/// An answer option. Correctness is never exposed on reads; the server
/// reveals it only through an attempt result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: i64,
    pub text: String,
}

/// Condensed row used by the question list view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub attempts: i64,
}

/// Payload for `POST /questions/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestion {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub choices: Vec<NewChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChoice {
    pub text: String,
    pub is_correct: bool,
}

/// Payload for submitting an answer to a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRequest {
    pub choice_id: i64,
}

/// Server verdict on a submitted attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    pub correct: bool,
    #[serde(default)]
    pub correct_choice: Option<i64>,
    #[serde(default)]
    pub score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author: User,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub body: String,
}

/// A 1-5 star rating for a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRequest {
    pub score: u8,
}

/// Aggregate rating returned after rating a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub score: i64,
}

/// Paginated list envelope (`count`/`next`/`previous`/`results`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: i64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Query parameters accepted by `GET /questions/`
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuestionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}
