// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{Registration, Session};

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Referral code: the username of an existing account
    #[serde(default)]
    pub refer: Option<String>,
}

/// POST /auth/register - Create an account and return a session
///
/// Expected Input:
/// ```json
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "string",
///   "refer": "Grace1718000000000"   // Optional referral code
/// }
/// ```
///
/// Responds 201 with `{ token, expires_in, user }`. An unknown or unusable
/// referral code does not fail the registration.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Session> {
    let Json(payload) = payload?;

    let (session, outcome) = state
        .accounts
        .register(Registration {
            name: payload.name.unwrap_or_default(),
            email: payload.email.unwrap_or_default(),
            password: payload.password.unwrap_or_default(),
            referral_code: payload.refer,
        })
        .await?;

    tracing::debug!("Registration of {} finished with referral outcome {:?}", session.user.id, outcome);
    Ok(ApiResponse::created(session))
}
