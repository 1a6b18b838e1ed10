use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::types::Role;

/// Coarse gate: the caller's stored role must rank at or above `minimum`.
/// Must run after `jwt_auth_middleware`.
pub async fn require_role(
    State(minimum): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before role check"))?;

    if !auth_user.account.role.at_least(minimum) {
        tracing::warn!(
            "Account {} with role {} refused on route requiring {}",
            auth_user.account.id,
            auth_user.account.role,
            minimum
        );
        return Err(ApiError::forbidden(format!("Access denied: requires {} role", minimum)));
    }

    Ok(next.run(request).await)
}
