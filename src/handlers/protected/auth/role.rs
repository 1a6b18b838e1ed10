// handlers/protected/auth/role.rs - PUT /api/auth/role

use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::PublicProfile;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Default, Deserialize)]
pub struct ChangeRoleRequest {
    /// Email of the account whose role changes
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "newRole")]
    pub new_role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChangeRoleResponse {
    pub message: String,
    pub user: PublicProfile,
}

/// PUT /api/auth/role - Change another account's role
///
/// Expected Input:
/// ```json
/// { "email": "bob@example.com", "newRole": "admin" }
/// ```
///
/// Errors:
/// - 400: missing fields or a role outside user/admin/superadmin
/// - 403: target ranks above the caller, or the role ranks above the caller
/// - 404: no account with that email
pub async fn role_put(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<ChangeRoleRequest>, JsonRejection>,
) -> ApiResult<ChangeRoleResponse> {
    let Json(payload) = payload?;
    let email = payload.email.unwrap_or_default();
    let new_role = payload.new_role.unwrap_or_default();

    let updated = state
        .accounts
        .change_role(&auth_user.account, &email, &new_role)
        .await?;

    Ok(ApiResponse::success(ChangeRoleResponse {
        message: format!("Role changed to {} for {}", updated.role, updated.email),
        user: PublicProfile::from(updated),
    }))
}
