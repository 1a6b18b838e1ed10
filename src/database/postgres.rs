use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{classify_insert_error, DatabaseError};
use crate::database::models::account::{Account, NewAccount};
use crate::database::repository::{AccountFilter, AccountStore};
use crate::types::Role;

const ACCOUNT_COLUMNS: &str = "id, name, email, password, username, role, credit, amount, created_at";

/// PostgreSQL-backed account store
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Account>, DatabaseError> {
        let query = format!("SELECT {} FROM accounts WHERE {} = $1", ACCOUNT_COLUMNS, column);
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DatabaseError> {
        self.find_one("username", username).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let query = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn create_account(&self, new: NewAccount) -> Result<Account, DatabaseError> {
        let query = format!(
            "INSERT INTO accounts (id, name, email, password, username)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.password)
            .bind(&new.username)
            .fetch_one(&self.pool)
            .await
            .map_err(classify_insert_error)
    }

    async fn increment_credit(&self, id: Uuid, delta: i64) -> Result<(), DatabaseError> {
        // Single-statement add; concurrent increments serialize on the row lock
        let result = sqlx::query("UPDATE accounts SET credit = credit + $2 WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Account {} not found", id)));
        }
        Ok(())
    }

    async fn apply_referral_bonus(
        &self,
        referrer_id: Uuid,
        referee_id: Uuid,
        delta: i64,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE accounts SET credit = credit + $3 WHERE id = $1 OR id = $2")
            .bind(referrer_id)
            .bind(referee_id)
            .bind(delta)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() != 2 {
            tx.rollback().await?;
            return Err(DatabaseError::NotFound(format!(
                "Referral pair {} / {} not found",
                referrer_id, referee_id
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE accounts SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Account {} not found", id)));
        }
        Ok(())
    }

    async fn set_role_if(&self, id: Uuid, expected: Role, role: Role) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE accounts SET role = $3 WHERE id = $1 AND role = $2")
            .bind(id)
            .bind(expected.as_str())
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Tell a vanished row apart from a lost race
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match exists {
            Some(_) => Ok(false),
            None => Err(DatabaseError::NotFound(format!("Account {} not found", id))),
        }
    }

    async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<Account>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM accounts
             WHERE ($1::text IS NULL OR role = $1)
             ORDER BY created_at, id",
            ACCOUNT_COLUMNS
        );
        let accounts = sqlx::query_as::<_, Account>(&query)
            .bind(filter.role.map(Role::as_str))
            .fetch_all(&self.pool)
            .await?;
        Ok(accounts)
    }

    async fn leaderboard(&self, filter: AccountFilter, limit: usize) -> Result<Vec<Account>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM accounts
             WHERE ($1::text IS NULL OR role = $1)
             ORDER BY amount DESC, created_at, id
             LIMIT $2",
            ACCOUNT_COLUMNS
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let accounts = sqlx::query_as::<_, Account>(&query)
            .bind(filter.role.map(Role::as_str))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(accounts)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
