//! Comment and rating endpoints

use quizdeck_core::{Comment, NewComment, Page, RatingRequest, RatingSummary};
use reqwest::Method;

use super::{ClientError, QuizClient};

impl QuizClient {
    /// List comments on a question
    pub async fn list_comments(&self, question_id: i64) -> Result<Page<Comment>, ClientError> {
        let request = self.request(Method::GET, &format!("/questions/{question_id}/comments/"));
        self.execute(request).await
    }

    /// Post a comment on a question
    pub async fn post_comment(
        &self,
        question_id: i64,
        comment: &NewComment,
    ) -> Result<Comment, ClientError> {
        let request = self
            .request(Method::POST, &format!("/questions/{question_id}/comments/"))
            .json(comment);
        self.execute(request).await
    }

    /// Rate a question and get the updated aggregate back
    pub async fn rate_question(
        &self,
        question_id: i64,
        rating: &RatingRequest,
    ) -> Result<RatingSummary, ClientError> {
        let request = self
            .request(Method::POST, &format!("/questions/{question_id}/ratings/"))
            .json(rating);
        self.execute(request).await
    }
}
