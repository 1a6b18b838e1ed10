use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::account::Account;
use crate::database::repository::AccountStore;

/// Credit granted to both the referrer and the new account
pub const REFERRAL_BONUS: i64 = 10;

/// What happened when a referral code was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralOutcome {
    NoCode,
    SelfReferral,
    UnknownCode,
    Credited { referrer_id: Uuid },
    /// Lookup or crediting failed; the registration still stands
    Failed,
}

/// Apply a referral code to an account that has just been created.
///
/// Never fails: unknown codes are ignored, and store errors are logged and
/// reported as `Failed` because the account itself is already committed.
pub async fn apply_referral(
    store: &dyn AccountStore,
    new_account: &Account,
    referral_code: Option<&str>,
) -> ReferralOutcome {
    let code = match referral_code.map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => return ReferralOutcome::NoCode,
    };

    if code == new_account.username {
        return ReferralOutcome::SelfReferral;
    }

    let referrer = match store.find_by_username(code).await {
        Ok(Some(referrer)) => referrer,
        Ok(None) => {
            info!("Referral code '{}' used by {} does not match any account", code, new_account.id);
            return ReferralOutcome::UnknownCode;
        }
        Err(e) => {
            warn!("Referral lookup for code '{}' failed: {}", code, e);
            return ReferralOutcome::Failed;
        }
    };

    // Username equality alone would not catch a code that collides with the new account
    if referrer.id == new_account.id {
        return ReferralOutcome::SelfReferral;
    }

    match store
        .apply_referral_bonus(referrer.id, new_account.id, REFERRAL_BONUS)
        .await
    {
        Ok(()) => {
            info!(
                "Referral bonus of {} credited to {} (referrer) and {} (new account)",
                REFERRAL_BONUS, referrer.id, new_account.id
            );
            ReferralOutcome::Credited { referrer_id: referrer.id }
        }
        Err(e) => {
            warn!(
                "Referral bonus for {} via code '{}' was not applied: {}",
                new_account.id, code, e
            );
            ReferralOutcome::Failed
        }
    }
}
