use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Role;

#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub username: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub credit: i64,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when inserting an account. Everything else takes its default.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub username: String,
}

/// Client-facing view of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub credit: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl From<&Account> for PublicProfile {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            username: account.username.clone(),
            role: account.role,
            credit: account.credit,
            amount: account.amount,
        }
    }
}

impl From<Account> for PublicProfile {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            username: account.username,
            role: account.role,
            credit: account.credit,
            amount: account.amount,
        }
    }
}

/// Derive the referral code for a new account: the first word of the
/// display name followed by the creation time in milliseconds.
pub fn generate_username(name: &str, created_at: DateTime<Utc>) -> String {
    let first = name.split_whitespace().next().unwrap_or_default();
    format!("{}{}", first, created_at.timestamp_millis())
}
