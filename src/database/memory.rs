use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::account::{Account, NewAccount};
use crate::database::repository::{AccountFilter, AccountStore};
use crate::types::Role;

/// Process-local account store. Used by tests and `serve --memory`.
///
/// Every mutation happens under the write lock, so increments are atomic and
/// the uniqueness checks on insert cannot race. Accounts are kept in
/// insertion order.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<Vec<Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite an account's donation total. Test fixtures only; the API
    /// has no donation endpoint.
    pub async fn set_amount(&self, id: Uuid, amount: Decimal) -> Result<(), DatabaseError> {
        if amount.is_sign_negative() {
            return Err(DatabaseError::QueryError("amount cannot be negative".to_string()));
        }
        let mut accounts = self.accounts.write().await;
        Self::get_mut(&mut accounts, id)?.amount = amount;
        Ok(())
    }

    fn get_mut(accounts: &mut [Account], id: Uuid) -> Result<&mut Account, DatabaseError> {
        accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Account {} not found", id)))
    }

    fn add_credit(accounts: &mut [Account], id: Uuid, delta: i64) -> Result<(), DatabaseError> {
        let account = Self::get_mut(accounts, id)?;
        let credit = account
            .credit
            .checked_add(delta)
            .filter(|c| *c >= 0)
            .ok_or_else(|| DatabaseError::QueryError("credit out of range".to_string()))?;
        account.credit = credit;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DatabaseError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn create_account(&self, new: NewAccount) -> Result<Account, DatabaseError> {
        let mut accounts = self.accounts.write().await;

        if accounts.iter().any(|a| a.email == new.email) {
            return Err(DatabaseError::Conflict("An account with this email already exists".to_string()));
        }
        if accounts.iter().any(|a| a.username == new.username) {
            return Err(DatabaseError::Conflict("An account with this username already exists".to_string()));
        }

        let account = Account {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password: new.password,
            username: new.username,
            role: Role::default(),
            credit: 0,
            amount: Decimal::ZERO,
            created_at: Utc::now(),
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn increment_credit(&self, id: Uuid, delta: i64) -> Result<(), DatabaseError> {
        let mut accounts = self.accounts.write().await;
        Self::add_credit(&mut accounts, id, delta)
    }

    async fn apply_referral_bonus(
        &self,
        referrer_id: Uuid,
        referee_id: Uuid,
        delta: i64,
    ) -> Result<(), DatabaseError> {
        let mut accounts = self.accounts.write().await;
        // Check both before touching either
        for id in [referrer_id, referee_id] {
            if !accounts.iter().any(|a| a.id == id) {
                return Err(DatabaseError::NotFound(format!("Account {} not found", id)));
            }
        }
        Self::add_credit(&mut accounts, referrer_id, delta)?;
        Self::add_credit(&mut accounts, referee_id, delta)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), DatabaseError> {
        let mut accounts = self.accounts.write().await;
        Self::get_mut(&mut accounts, id)?.role = role;
        Ok(())
    }

    async fn set_role_if(&self, id: Uuid, expected: Role, role: Role) -> Result<bool, DatabaseError> {
        let mut accounts = self.accounts.write().await;
        let account = Self::get_mut(&mut accounts, id)?;
        if account.role != expected {
            return Ok(false);
        }
        account.role = role;
        Ok(true)
    }

    async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<Account>, DatabaseError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().filter(|a| filter.matches(a)).cloned().collect())
    }

    async fn leaderboard(&self, filter: AccountFilter, limit: usize) -> Result<Vec<Account>, DatabaseError> {
        let mut ranked = self.list_accounts(filter).await?;
        // list_accounts is already in creation order and the sort is stable
        ranked.sort_by(|a, b| b.amount.cmp(&a.amount));
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
