use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::account::{Account, NewAccount};
use crate::types::Role;

/// Optional constraints for account listings
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountFilter {
    pub role: Option<Role>,
}

impl AccountFilter {
    pub fn role(role: Role) -> Self {
        Self { role: Some(role) }
    }

    pub fn matches(&self, account: &Account) -> bool {
        self.role.map_or(true, |role| account.role == role)
    }
}

/// Storage abstraction for accounts.
///
/// Credit changes go through `increment_credit`, which must be an atomic
/// add at the storage layer. Implementations never read a credit value,
/// compute a new one and write it back.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError>;

    /// Insert a new account. Fails with `Conflict` on duplicate email or username.
    async fn create_account(&self, account: NewAccount) -> Result<Account, DatabaseError>;

    async fn increment_credit(&self, id: Uuid, delta: i64) -> Result<(), DatabaseError>;

    /// Credit both sides of a referral. Stores with transactions should
    /// override this so the pair lands together.
    async fn apply_referral_bonus(
        &self,
        referrer_id: Uuid,
        referee_id: Uuid,
        delta: i64,
    ) -> Result<(), DatabaseError> {
        self.increment_credit(referrer_id, delta).await?;
        self.increment_credit(referee_id, delta).await
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), DatabaseError>;

    /// Set the role only while the stored role still equals `expected`.
    /// Returns `false` when the role had already changed and nothing was written.
    async fn set_role_if(&self, id: Uuid, expected: Role, role: Role) -> Result<bool, DatabaseError>;

    async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<Account>, DatabaseError>;

    /// Accounts ordered by donation amount, highest first; ties go to the older account
    async fn leaderboard(&self, filter: AccountFilter, limit: usize) -> Result<Vec<Account>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
