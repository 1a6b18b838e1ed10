pub mod account_service;
pub mod referral_credit;
pub mod role_authorizer;

pub use account_service::{AccountService, Registration, Session};
pub use referral_credit::{apply_referral, ReferralOutcome, REFERRAL_BONUS};
pub use role_authorizer::{authorize, RoleDenial};
