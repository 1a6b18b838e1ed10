// handlers/protected/admin.rs - GET /api/admin

use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/admin - Confirms the caller passed the admin gate
pub async fn admin_get(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "message": "Welcome Admin",
        "role": auth_user.account.role,
    })))
}
