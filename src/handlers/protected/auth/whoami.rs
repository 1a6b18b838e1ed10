// handlers/protected/auth/whoami.rs - GET /api/auth/whoami

use axum::Extension;

use crate::database::PublicProfile;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/whoami - Profile of the authenticated caller
pub async fn whoami_get(Extension(auth_user): Extension<AuthUser>) -> ApiResult<PublicProfile> {
    Ok(ApiResponse::success(PublicProfile::from(auth_user.account)))
}
