// handlers/protected/users/leaderboard.rs - GET /api/leaderboard

use axum::extract::{rejection::QueryRejection, Query, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::config::MAX_LEADERBOARD_LIMIT;
use crate::database::PublicProfile;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

/// GET /api/leaderboard[?limit=N] - Users ranked by donation amount, highest first
pub async fn leaderboard_get(
    State(state): State<AppState>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> ApiResult<Vec<PublicProfile>> {
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(state.leaderboard_limit)
        .clamp(1, MAX_LEADERBOARD_LIMIT);

    let ranked = state.accounts.leaderboard(limit).await?;
    Ok(ApiResponse::success(ranked))
}
