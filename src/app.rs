use axum::{
    extract::State,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, require_role, ApiResponse, ApiResult};
use crate::services::AccountService;
use crate::types::Role;

/// Shared state handed to every handler and to the auth middleware
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    /// Leaderboard size when `?limit=` is absent
    pub leaderboard_limit: usize,
}

impl AppState {
    pub fn new(accounts: AccountService, leaderboard_limit: usize) -> Self {
        Self {
            accounts,
            leaderboard_limit,
        }
    }
}

/// Build the full router. An empty origin list allows any origin.
pub fn app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected (JWT required)
        .merge(protected_routes(state.clone()))
        .with_state(state)
        // Global middleware
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{admin, auth, users};

    // Admin and above; the fine-grained hierarchy check for role changes
    // happens in the service
    let admin_routes = Router::new()
        .route("/api/admin", get(admin::admin_get))
        .route("/api/auth/role", put(auth::role_put))
        .route("/api/users", get(users::users_get))
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role));

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route("/api/members", get(users::members_get))
        .route("/api/leaderboard", get(users::leaderboard_get))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
    }
}

async fn root() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "public": ["/health", "/auth/register", "/auth/login"],
            "protected": [
                "/api/auth/whoami",
                "/api/auth/role",
                "/api/admin",
                "/api/users",
                "/api/members",
                "/api/leaderboard"
            ]
        }
    })))
}

async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    state.accounts.store().health_check().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable("Account store unavailable")
    })?;

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
