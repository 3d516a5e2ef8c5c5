//! Quizdeck core types and events

pub mod events;
pub mod types;

pub use events::{SessionEvent, SessionEvents};
pub use types::{
    AttemptRequest, AttemptResult, AuthResponse, Choice, Comment, LeaderboardEntry, LoginRequest,
    NewChoice, NewComment, NewQuestion, Page, Question, QuestionQuery, QuestionSummary,
    RatingRequest, RatingSummary, RegisterRequest, User,
};
