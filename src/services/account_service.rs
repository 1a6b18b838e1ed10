use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{JwtKeys, PasswordHashing};
use crate::database::models::account::{generate_username, Account, NewAccount, PublicProfile};
use crate::database::repository::{AccountFilter, AccountStore};
use crate::error::ApiError;
use crate::services::referral_credit::{apply_referral, ReferralOutcome};
use crate::services::role_authorizer;
use crate::types::Role;

/// Input for account registration
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub referral_code: Option<String>,
}

/// Token plus profile handed back on register and login
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_in: i64,
    pub user: PublicProfile,
}

/// Account workflows: registration, login, role changes and listings
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    jwt: JwtKeys,
    passwords: PasswordHashing,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, jwt: JwtKeys, passwords: PasswordHashing) -> Self {
        Self { store, jwt, passwords }
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    pub fn jwt(&self) -> &JwtKeys {
        &self.jwt
    }

    /// Create an account, then apply the referral code if one was given.
    ///
    /// A referral that cannot be applied never fails the registration.
    pub async fn register(&self, registration: Registration) -> Result<(Session, ReferralOutcome), ApiError> {
        let mut missing = Vec::new();
        if registration.name.trim().is_empty() {
            missing.push("name");
        }
        if registration.email.trim().is_empty() {
            missing.push("email");
        }
        if registration.password.is_empty() {
            missing.push("password");
        }
        if !missing.is_empty() {
            return Err(ApiError::missing_fields(&missing));
        }
        validate_email_format(&registration.email)?;

        let password = self.passwords.hash_blocking(registration.password).await?;
        let username = generate_username(&registration.name, Utc::now());

        let account = self
            .store
            .create_account(NewAccount {
                name: registration.name.trim().to_string(),
                email: registration.email,
                password,
                username,
            })
            .await?;
        info!("Registered account {} ({})", account.id, account.username);

        let outcome = apply_referral(self.store.as_ref(), &account, registration.referral_code.as_deref()).await;

        // Pick up the bonus in the returned profile
        let account = match outcome {
            ReferralOutcome::Credited { .. } => match self.store.find_by_id(account.id).await {
                Ok(Some(fresh)) => fresh,
                Ok(None) => account,
                Err(e) => {
                    warn!("Could not reload account {} after referral: {}", account.id, e);
                    account
                }
            },
            _ => account,
        };

        Ok((self.session_for(&account)?, outcome))
    }

    /// Check credentials. Unknown email and wrong password are indistinguishable.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        if email.trim().is_empty() || password.is_empty() {
            let mut missing = Vec::new();
            if email.trim().is_empty() {
                missing.push("email");
            }
            if password.is_empty() {
                missing.push("password");
            }
            return Err(ApiError::missing_fields(&missing));
        }

        let invalid = || ApiError::unauthorized("Invalid email or password");

        let account = self.store.find_by_email(email).await?.ok_or_else(invalid)?;
        let matches = self
            .passwords
            .verify_blocking(password.to_string(), account.password.clone())
            .await?;
        if !matches {
            warn!("Failed login for account {}", account.id);
            return Err(invalid());
        }

        info!("Account {} logged in", account.id);
        self.session_for(&account)
    }

    /// Change the role of the account registered under `target_email`.
    ///
    /// The requested role is parsed before anything is looked up, and the
    /// hierarchy check runs before any write.
    pub async fn change_role(
        &self,
        requester: &Account,
        target_email: &str,
        requested_role: &str,
    ) -> Result<Account, ApiError> {
        let mut missing = Vec::new();
        if target_email.trim().is_empty() {
            missing.push("email");
        }
        if requested_role.trim().is_empty() {
            missing.push("newRole");
        }
        if !missing.is_empty() {
            return Err(ApiError::missing_fields(&missing));
        }

        let requested: Role = requested_role.parse()?;

        let mut target = self
            .store
            .find_by_email(target_email)
            .await?
            .ok_or_else(|| ApiError::not_found("Target user not found"))?;

        if let Err(denial) = role_authorizer::authorize(requester.role, target.role, requested) {
            warn!(
                "Role change denied ({}): {} [{}] -> {} [{}] as {}",
                denial.code(),
                requester.id,
                requester.role,
                target.email,
                target.role,
                requested
            );
            return Err(denial.into());
        }

        // Write only if the role the decision was made on is still the stored one
        if !self.store.set_role_if(target.id, target.role, requested).await? {
            warn!(
                "Role of {} changed while {} was updating it; nothing written",
                target.email, requester.id
            );
            return Err(ApiError::conflict("Target role changed during the update, retry the request"));
        }
        info!(
            "Role of {} changed from {} to {} by {}",
            target.email, target.role, requested, requester.id
        );

        target.role = requested;
        Ok(target)
    }

    pub async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<PublicProfile>, ApiError> {
        let accounts = self.store.list_accounts(filter).await?;
        Ok(accounts.into_iter().map(PublicProfile::from).collect())
    }

    /// Plain users ranked by donation amount
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<PublicProfile>, ApiError> {
        let accounts = self.store.leaderboard(AccountFilter::role(Role::User), limit).await?;
        Ok(accounts.into_iter().map(PublicProfile::from).collect())
    }

    fn session_for(&self, account: &Account) -> Result<Session, ApiError> {
        Ok(Session {
            token: self.jwt.issue_token(account.id, account.role)?,
            expires_in: self.jwt.expires_in_secs(),
            user: PublicProfile::from(account),
        })
    }
}

/// Basic shape check: one '@' with text on both sides and a dot in the domain
pub fn validate_email_format(email: &str) -> Result<(), ApiError> {
    let invalid = || {
        let mut field_errors = std::collections::HashMap::new();
        field_errors.insert("email".to_string(), "Invalid email format".to_string());
        ApiError::validation_error("Invalid email format", Some(field_errors))
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryAccountStore;
    use crate::database::DatabaseError;
    use crate::services::referral_credit::REFERRAL_BONUS;

    fn service() -> (AccountService, Arc<MemoryAccountStore>) {
        let store = Arc::new(MemoryAccountStore::new());
        let service = AccountService::new(
            store.clone(),
            JwtKeys::new("test-secret", 1).unwrap(),
            PasswordHashing::new(1024, 1),
        );
        (service, store)
    }

    fn registration(name: &str, email: &str, refer: Option<&str>) -> Registration {
        Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: "hunter22".to_string(),
            referral_code: refer.map(str::to_string),
        }
    }

    #[test]
    fn email_format() {
        assert!(validate_email_format("ada@example.com").is_ok());
        assert!(validate_email_format("ada@example").is_err());
        assert!(validate_email_format("@example.com").is_err());
        assert!(validate_email_format("ada@@example.com").is_err());
        assert!(validate_email_format("ada lovelace@example.com").is_err());
        assert!(validate_email_format("ada").is_err());
    }

    #[tokio::test]
    async fn register_assigns_defaults_and_username() {
        let (service, _) = service();
        let (session, outcome) = service
            .register(registration("Ada Lovelace", "ada@example.com", None))
            .await
            .unwrap();

        assert_eq!(outcome, ReferralOutcome::NoCode);
        assert_eq!(session.user.role, Role::User);
        assert_eq!(session.user.credit, 0);
        assert!(session.user.username.starts_with("Ada"));
        assert!(session.user.username["Ada".len()..].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(service.jwt().validate_token(&session.token).unwrap().sub, session.user.id);
    }

    #[tokio::test]
    async fn register_requires_fields() {
        let (service, store) = service();
        let err = service.register(registration("", "", None)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(store.list_accounts(AccountFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn referral_bonus_shows_in_returned_profile() {
        let (service, store) = service();
        let (ada, _) = service
            .register(registration("Ada", "ada@example.com", None))
            .await
            .unwrap();
        let (bob, outcome) = service
            .register(registration("Bob", "bob@example.com", Some(&ada.user.username)))
            .await
            .unwrap();

        assert_eq!(outcome, ReferralOutcome::Credited { referrer_id: ada.user.id });
        assert_eq!(bob.user.credit, REFERRAL_BONUS);
        assert_eq!(store.find_by_id(ada.user.id).await.unwrap().unwrap().credit, REFERRAL_BONUS);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (service, store) = service();
        service.register(registration("Ada", "ada@example.com", None)).await.unwrap();
        let err = service
            .register(registration("Other", "ada@example.com", None))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(store.list_accounts(AccountFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_checks_password() {
        let (service, _) = service();
        service.register(registration("Ada", "ada@example.com", None)).await.unwrap();

        let session = service.login("ada@example.com", "hunter22").await.unwrap();
        assert_eq!(session.user.email, "ada@example.com");

        let wrong = service.login("ada@example.com", "nope").await.unwrap_err();
        let unknown = service.login("nobody@example.com", "hunter22").await.unwrap_err();
        assert_eq!(wrong.status_code(), 401);
        assert_eq!(unknown.status_code(), 401);
        assert_eq!(wrong.message(), unknown.message());
    }

    #[tokio::test]
    async fn change_role_validates_before_lookup() {
        let (service, store) = service();
        let (admin, _) = service.register(registration("Root", "root@example.com", None)).await.unwrap();
        store.set_role(admin.user.id, Role::SuperAdmin).await.unwrap();
        let requester = store.find_by_id(admin.user.id).await.unwrap().unwrap();

        let err = service.change_role(&requester, "missing@example.com", "manager").await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ROLE");

        let err = service.change_role(&requester, "missing@example.com", "admin").await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        let err = service.change_role(&requester, "", "admin").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn denied_role_change_leaves_target_untouched() {
        let (service, store) = service();
        let (a, _) = service.register(registration("Ann", "ann@example.com", None)).await.unwrap();
        let (b, _) = service.register(registration("Ben", "ben@example.com", None)).await.unwrap();
        store.set_role(a.user.id, Role::Admin).await.unwrap();
        let requester = store.find_by_id(a.user.id).await.unwrap().unwrap();

        let err = service
            .change_role(&requester, "ben@example.com", "superadmin")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(store.find_by_id(b.user.id).await.unwrap().unwrap().role, Role::User);

        let updated = service.change_role(&requester, "ben@example.com", "admin").await.unwrap();
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(store.find_by_id(b.user.id).await.unwrap().unwrap().role, Role::Admin);
    }

    /// Store that promotes the looked-up account to superadmin right after
    /// handing out the snapshot, as a concurrent superadmin would
    struct PromoteAfterRead {
        inner: Arc<MemoryAccountStore>,
    }

    #[async_trait::async_trait]
    impl AccountStore for PromoteAfterRead {
        async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
            let snapshot = self.inner.find_by_email(email).await?;
            if let Some(account) = &snapshot {
                self.inner.set_role(account.id, Role::SuperAdmin).await?;
            }
            Ok(snapshot)
        }
        async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DatabaseError> {
            self.inner.find_by_username(username).await
        }
        async fn find_by_id(&self, id: uuid::Uuid) -> Result<Option<Account>, DatabaseError> {
            self.inner.find_by_id(id).await
        }
        async fn create_account(&self, account: NewAccount) -> Result<Account, DatabaseError> {
            self.inner.create_account(account).await
        }
        async fn increment_credit(&self, id: uuid::Uuid, delta: i64) -> Result<(), DatabaseError> {
            self.inner.increment_credit(id, delta).await
        }
        async fn set_role(&self, id: uuid::Uuid, role: Role) -> Result<(), DatabaseError> {
            self.inner.set_role(id, role).await
        }
        async fn set_role_if(&self, id: uuid::Uuid, expected: Role, role: Role) -> Result<bool, DatabaseError> {
            self.inner.set_role_if(id, expected, role).await
        }
        async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<Account>, DatabaseError> {
            self.inner.list_accounts(filter).await
        }
        async fn leaderboard(&self, filter: AccountFilter, limit: usize) -> Result<Vec<Account>, DatabaseError> {
            self.inner.leaderboard(filter, limit).await
        }
        async fn health_check(&self) -> Result<(), DatabaseError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn role_change_does_not_overwrite_a_concurrent_promotion() {
        let (service, inner) = service();
        let (admin, _) = service.register(registration("Ann", "ann@example.com", None)).await.unwrap();
        let (target, _) = service.register(registration("Ben", "ben@example.com", None)).await.unwrap();
        inner.set_role(admin.user.id, Role::Admin).await.unwrap();
        inner.set_role(target.user.id, Role::Admin).await.unwrap();
        let requester = inner.find_by_id(admin.user.id).await.unwrap().unwrap();

        let racing = AccountService::new(
            Arc::new(PromoteAfterRead { inner: inner.clone() }),
            JwtKeys::new("test-secret", 1).unwrap(),
            PasswordHashing::new(1024, 1),
        );

        let err = racing.change_role(&requester, "ben@example.com", "user").await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(inner.find_by_id(target.user.id).await.unwrap().unwrap().role, Role::SuperAdmin);
    }
}
