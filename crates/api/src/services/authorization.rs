//! Who may act on which user record.

use crate::models::User;

/// A mutation of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Update,
    Delete,
    /// Grant or revoke the staff flag.
    ChangeStaffStatus,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decide whether `actor` may perform `action` on `target`.
///
/// Staff may do anything. Everyone else may update or delete only their own
/// record and may never touch the staff flag.
#[must_use]
pub fn authorize_user_action(actor: &User, target: &User, action: UserAction) -> Decision {
    if actor.is_staff {
        return Decision::Allow;
    }
    match action {
        UserAction::Update if actor.id == target.id => Decision::Allow,
        UserAction::Update => Decision::Deny("You are not authorized to update this user."),
        UserAction::Delete if actor.id == target.id => Decision::Allow,
        UserAction::Delete => Decision::Deny("You are not authorized to delete this user."),
        UserAction::ChangeStaffStatus => {
            Decision::Deny("You are not authorized to change staff status.")
        }
    }
}
