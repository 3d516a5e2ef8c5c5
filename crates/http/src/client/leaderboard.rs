//! Leaderboard endpoint

use quizdeck_core::LeaderboardEntry;
use reqwest::Method;

use super::{ClientError, QuizClient};

impl QuizClient {
    /// Fetch the top-scoring users, optionally capped at `limit` rows
    pub async fn leaderboard(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<LeaderboardEntry>, ClientError> {
        let mut request = self.request(Method::GET, "/leaderboard/");
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.execute(request).await
    }
}
