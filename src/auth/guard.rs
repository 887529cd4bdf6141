//! Authorization Guard
//! Mission: Decide allow/deny for every user, list and item operation
//!
//! Decisions are pure functions of the caller's [`Identity`] and the owner
//! resolved from the store at request time. Nothing here touches the store.
//!
//! Existence policy: a non-admin asking about a list or item they do not own
//! gets [`AccessError::Forbidden`] whether or not the target exists. Admins can
//! see every row, so for them a missing target is reported as such.

use crate::auth::models::Identity;

/// Outcome of a denied guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// Valid identity, insufficient rights.
    Forbidden,
    /// Target id does not exist (only ever reported to admins).
    NotFound,
    /// A referenced parent does not exist (only ever reported to admins).
    MissingReference,
}

/// How a missing target should be reported to a caller allowed to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// The id is the addressed resource itself (`/lists/{id}`, `/items/{id}`).
    Target,
    /// The id names a parent the request depends on (`/lists/{listId}/items`).
    Reference,
}

impl Missing {
    fn into_error(self) -> AccessError {
        match self {
            Missing::Target => AccessError::NotFound,
            Missing::Reference => AccessError::MissingReference,
        }
    }
}

/// Which lists a caller may enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    OwnedBy(i64),
    All,
}

/// User management is admin-only.
pub fn require_admin(identity: &Identity) -> Result<(), AccessError> {
    if identity.is_admin {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}

/// Non-admins may only create lists for themselves; admins for anyone.
pub fn authorize_list_create(identity: &Identity, owner_id: i64) -> Result<(), AccessError> {
    if identity.is_admin || owner_id == identity.user_id {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}

/// Read/update/delete on a list or item, given the owner resolved from the store.
///
/// `owner` is `None` when the target (or its parent list) does not exist.
pub fn authorize_owned(
    identity: &Identity,
    owner: Option<i64>,
    missing: Missing,
) -> Result<(), AccessError> {
    match owner {
        Some(owner_id) if identity.is_admin || owner_id == identity.user_id => Ok(()),
        Some(_) => Err(AccessError::Forbidden),
        None if identity.is_admin => Err(missing.into_error()),
        None => Err(AccessError::Forbidden),
    }
}

pub fn list_scope(identity: &Identity) -> ListScope {
    if identity.is_admin {
        ListScope::All
    } else {
        ListScope::OwnedBy(identity.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> Identity {
        Identity {
            user_id: id,
            username: format!("user{id}"),
            is_admin: false,
        }
    }

    fn admin(id: i64) -> Identity {
        Identity {
            is_admin: true,
            ..user(id)
        }
    }

    #[test]
    fn test_user_management_requires_admin() {
        assert_eq!(require_admin(&admin(1)), Ok(()));
        assert_eq!(require_admin(&user(2)), Err(AccessError::Forbidden));
    }

    #[test]
    fn test_list_create_for_self_or_by_admin() {
        assert_eq!(authorize_list_create(&user(2), 2), Ok(()));
        assert_eq!(authorize_list_create(&user(2), 3), Err(AccessError::Forbidden));
        assert_eq!(authorize_list_create(&admin(1), 3), Ok(()));
    }

    #[test]
    fn test_owner_may_act() {
        assert_eq!(authorize_owned(&user(5), Some(5), Missing::Target), Ok(()));
    }

    #[test]
    fn test_non_owner_forbidden() {
        assert_eq!(
            authorize_owned(&user(5), Some(6), Missing::Target),
            Err(AccessError::Forbidden)
        );
    }

    #[test]
    fn test_admin_may_act_on_any_owner() {
        assert_eq!(authorize_owned(&admin(1), Some(6), Missing::Target), Ok(()));
    }

    #[test]
    fn test_missing_target_hidden_from_non_admin() {
        // Same answer as for a foreign target
        assert_eq!(
            authorize_owned(&user(5), None, Missing::Target),
            Err(AccessError::Forbidden)
        );
        assert_eq!(
            authorize_owned(&user(5), None, Missing::Reference),
            Err(AccessError::Forbidden)
        );
    }

    #[test]
    fn test_missing_target_reported_to_admin() {
        assert_eq!(
            authorize_owned(&admin(1), None, Missing::Target),
            Err(AccessError::NotFound)
        );
        assert_eq!(
            authorize_owned(&admin(1), None, Missing::Reference),
            Err(AccessError::MissingReference)
        );
    }

    #[test]
    fn test_list_scope() {
        assert_eq!(list_scope(&user(9)), ListScope::OwnedBy(9));
        assert_eq!(list_scope(&admin(1)), ListScope::All);
    }
}
