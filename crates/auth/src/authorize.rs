//! Resource access policy for mutating operations.
//!
//! - No IO
//! - No panics
//! - Pure ownership check (create and read operations never consult it)

use core::fmt;

use thiserror::Error;

use bookshelf_core::UserId;

/// A resource with exactly one owner, fixed at creation.
pub trait Owned {
    fn owner(&self) -> UserId;
}

/// Mutating operations subject to the ownership policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MutatingAction {
    Update,
    Delete,
}

impl MutatingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutatingAction::Update => "update",
            MutatingAction::Delete => "delete",
        }
    }
}

impl fmt::Display for MutatingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resource exists but the actor is not its owner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{actor} may not {action} a resource owned by {owner}")]
pub struct AccessDenied {
    pub action: MutatingAction,
    pub owner: UserId,
    pub actor: UserId,
}

/// Allow `action` on `resource` iff `actor` is the resource's owner.
pub fn authorize<R: Owned + ?Sized>(
    resource: &R,
    actor: UserId,
    action: MutatingAction,
) -> Result<(), AccessDenied> {
    let owner = resource.owner();
    if owner == actor {
        Ok(())
    } else {
        Err(AccessDenied { action, owner, actor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    struct Doc(UserId);

    impl Owned for Doc {
        fn owner(&self) -> UserId {
            self.0
        }
    }

    #[test]
    fn owner_is_allowed() {
        let owner = UserId::new();
        assert_eq!(authorize(&Doc(owner), owner, MutatingAction::Update), Ok(()));
        assert_eq!(authorize(&Doc(owner), owner, MutatingAction::Delete), Ok(()));
    }

    #[test]
    fn other_actor_is_denied_with_context() {
        let owner = UserId::new();
        let actor = UserId::new();

        let denied = authorize(&Doc(owner), actor, MutatingAction::Delete).unwrap_err();
        assert_eq!(denied.action, MutatingAction::Delete);
        assert_eq!(denied.owner, owner);
        assert_eq!(denied.actor, actor);
    }

    proptest! {
        /// Property: the policy allows exactly when the ids are equal.
        #[test]
        fn allowed_iff_ids_match(a in any::<u128>(), b in any::<u128>()) {
            let owner = UserId::from_uuid(Uuid::from_u128(a));
            let actor = UserId::from_uuid(Uuid::from_u128(b));
            let result = authorize(&Doc(owner), actor, MutatingAction::Update);
            prop_assert_eq!(result.is_ok(), a == b);
        }
    }
}
