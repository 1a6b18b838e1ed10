#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

use referral_api::auth::{JwtKeys, PasswordHashing};
use referral_api::config::DatabaseConfig;
use referral_api::database::{schema, AccountStore, DatabaseManager, MemoryAccountStore, NewAccount, PgAccountStore};
use referral_api::services::AccountService;
use referral_api::types::Role;
use referral_api::{app, AppState};

static SCHEMA_READY: Lazy<OnceCell<()>> = Lazy::new(OnceCell::new);

pub const PASSWORD: &str = "correct horse battery staple";

/// Router wired to an in-memory store, with cheap password hashing
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryAccountStore>,
}

/// A registered account and its bearer token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_leaderboard_limit(50)
    }

    pub fn with_leaderboard_limit(limit: usize) -> Result<Self> {
        let store = Arc::new(MemoryAccountStore::new());
        let jwt = JwtKeys::new("integration-test-secret", 1)?;
        let passwords = PasswordHashing::new(1024, 1);
        let service = AccountService::new(store.clone(), jwt, passwords);
        let router = app(AppState::new(service, limit), &[]);
        Ok(Self { router, store })
    }

    /// Send a request and decode the JSON body
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| {
                format!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })?
        };
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, path, None, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, path, Some(token), Some(body)).await
    }

    /// Register through the API and return the created account
    pub async fn register(&self, name: &str, email: &str, refer: Option<&str>) -> Result<TestUser> {
        let mut body = json!({ "name": name, "email": email, "password": PASSWORD });
        if let Some(code) = refer {
            body["refer"] = json!(code);
        }
        let (status, body) = self.post("/auth/register", body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register {} failed: {} {}", email, status, body);
        user_from_session(&body["data"])
    }

    /// Register, then set the stored role directly
    pub async fn register_with_role(&self, name: &str, email: &str, role: Role) -> Result<TestUser> {
        let user = self.register(name, email, None).await?;
        self.store.set_role(user.id, role).await?;
        Ok(user)
    }

    /// Current stored profile, read through `/api/auth/whoami`
    pub async fn whoami(&self, user: &TestUser) -> Result<Value> {
        let (status, body) = self.get("/api/auth/whoami", Some(&user.token)).await?;
        anyhow::ensure!(status == StatusCode::OK, "whoami failed: {} {}", status, body);
        Ok(body["data"].clone())
    }
}

fn user_from_session(session: &Value) -> Result<TestUser> {
    let user = &session["user"];
    Ok(TestUser {
        id: user["id"].as_str().context("missing user.id")?.parse()?,
        email: user["email"].as_str().context("missing user.email")?.to_string(),
        username: user["username"].as_str().context("missing user.username")?.to_string(),
        token: session["token"].as_str().context("missing token")?.to_string(),
    })
}

/// Store against the database in `DATABASE_URL` (read from `.env` too), with
/// the schema in place. `None` when no database is configured.
pub async fn pg_store() -> Result<Option<PgAccountStore>> {
    let _ = dotenvy::dotenv();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping PostgreSQL test");
        return Ok(None);
    };

    let config = DatabaseConfig {
        max_connections: 16,
        connection_timeout: 10,
    };
    let pool = DatabaseManager::connect_url(&url, &config)
        .await
        .context("failed to connect to DATABASE_URL")?;
    // Concurrent CREATE TABLE IF NOT EXISTS can still race in the catalog
    SCHEMA_READY
        .get_or_try_init(|| schema::ensure_schema(&pool))
        .await?;
    Ok(Some(PgAccountStore::new(pool)))
}

/// Insert fields that cannot collide with rows left by earlier runs
pub fn unique_account(label: &str) -> NewAccount {
    let tag = Uuid::new_v4().simple().to_string();
    NewAccount {
        name: label.to_string(),
        email: format!("{}-{}@example.com", label, tag),
        password: "not-a-real-hash".to_string(),
        username: format!("{}{}", label, tag),
    }
}
