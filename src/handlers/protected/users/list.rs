// handlers/protected/users/list.rs - account listings

use axum::extract::{rejection::QueryRejection, Query, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::{AccountFilter, PublicProfile};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Role;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub role: Option<String>,
}

/// GET /api/users[?role=admin] - All accounts, admin and above only
pub async fn users_get(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<PublicProfile>> {
    let Query(query) = query?;

    let filter = match query.role.as_deref().map(str::trim) {
        None | Some("") => AccountFilter::default(),
        Some(role) => AccountFilter::role(role.parse::<Role>()?),
    };

    let users = state.accounts.list_accounts(filter).await?;
    Ok(ApiResponse::success(users))
}

/// GET /api/members - Accounts holding the plain `user` role, for any caller
pub async fn members_get(State(state): State<AppState>) -> ApiResult<Vec<PublicProfile>> {
    let users = state.accounts.list_accounts(AccountFilter::role(Role::User)).await?;
    Ok(ApiResponse::success(users))
}
