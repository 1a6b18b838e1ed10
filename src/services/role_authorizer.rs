use thiserror::Error;

use crate::types::Role;

/// Reason a role change was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoleDenial {
    #[error("Cannot modify users above your hierarchy")]
    CannotModifyAboveHierarchy,

    #[error("Cannot assign role higher than your own")]
    CannotGrantAboveOwnLevel,
}

impl RoleDenial {
    pub fn code(self) -> &'static str {
        match self {
            RoleDenial::CannotModifyAboveHierarchy => "cannot-modify-above-hierarchy",
            RoleDenial::CannotGrantAboveOwnLevel => "cannot-grant-above-own-level",
        }
    }
}

/// Decide whether `requester` may move a target currently at `target` to `requested`.
///
/// The target check runs first: a requester can never touch an account ranked
/// above them, whatever the requested role. Granting a role equal to the
/// requester's own level is allowed.
pub fn authorize(requester: Role, target: Role, requested: Role) -> Result<(), RoleDenial> {
    if target.level() > requester.level() {
        return Err(RoleDenial::CannotModifyAboveHierarchy);
    }
    if requested.level() > requester.level() {
        return Err(RoleDenial::CannotGrantAboveOwnLevel);
    }
    Ok(())
}
