//! Question browsing and authoring endpoints

use quizdeck_core::{
    AttemptRequest, AttemptResult, NewQuestion, Page, Question, QuestionQuery, QuestionSummary,
};
use reqwest::Method;

use super::{ClientError, QuizClient};

impl QuizClient {
    /// List questions, paginated and optionally filtered
    pub async fn list_questions(
        &self,
        query: &QuestionQuery,
    ) -> Result<Page<QuestionSummary>, ClientError> {
        let request = self.request(Method::GET, "/questions/").query(query);
        self.execute(request).await
    }

    /// Fetch a single question with its answer choices
    pub async fn get_question(&self, id: i64) -> Result<Question, ClientError> {
        let request = self.request(Method::GET, &format!("/questions/{id}/"));
        self.execute(request).await
    }

    /// Post a new question
    pub async fn create_question(&self, question: &NewQuestion) -> Result<Question, ClientError> {
        let request = self.request(Method::POST, "/questions/").json(question);
        self.execute(request).await
    }

    /// Submit an answer to a question
    pub async fn submit_attempt(
        &self,
        question_id: i64,
        attempt: &AttemptRequest,
    ) -> Result<AttemptResult, ClientError> {
        let request = self
            .request(Method::POST, &format!("/questions/{question_id}/attempts/"))
            .json(attempt);
        self.execute(request).await
    }
}
