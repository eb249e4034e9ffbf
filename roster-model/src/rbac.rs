//! Privilege helpers.
//!
//! The server enforces authorization; the console only mirrors it. The one
//! decision taken client-side is whether the caller holds the privileged
//! role, which unlocks the console views.

use crate::ids::UserId;
use crate::role::Role;
use crate::user::Identity;

/// Role name that grants access to the admin console.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Role assigned to ordinary accounts.
pub const USER_ROLE: &str = "USER";

/// Privilege checker for the current identity
#[derive(Debug, Clone, Copy)]
pub struct PrivilegeChecker<'a> {
    identity: Option<&'a Identity>,
    privileged_role: &'a str,
}

impl<'a> PrivilegeChecker<'a> {
    /// Checker using the default [`ADMIN_ROLE`].
    pub fn new(identity: Option<&'a Identity>) -> Self {
        Self::with_role(identity, ADMIN_ROLE)
    }

    pub fn with_role(
        identity: Option<&'a Identity>,
        privileged_role: &'a str,
    ) -> Self {
        Self {
            identity,
            privileged_role,
        }
    }

    /// No identity (not loaded, or unavailable) is never privileged.
    pub fn is_privileged(&self) -> bool {
        self.identity
            .map(|identity| holds_role(identity.roles(), self.privileged_role))
            .unwrap_or(false)
    }

    pub fn is_self(&self, user_id: UserId) -> bool {
        self.identity
            .map(|identity| identity.id() == user_id)
            .unwrap_or(false)
    }
}

pub fn holds_role(roles: &[Role], role_name: &str) -> bool {
    roles.iter().any(|r| r.name == role_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::User;

    fn identity(roles: &[&str]) -> Identity {
        Identity::new(User {
            id: UserId(7),
            first_name: String::new(),
            last_name: String::new(),
            age: None,
            email: "u@example.com".into(),
            roles: roles.iter().map(|r| Role::new(*r)).collect(),
        })
    }

    #[test]
    fn privilege_requires_admin_role() {
        let admin = identity(&["USER", "ADMIN"]);
        let plain = identity(&["USER"]);
        assert!(PrivilegeChecker::new(Some(&admin)).is_privileged());
        assert!(!PrivilegeChecker::new(Some(&plain)).is_privileged());
        assert!(!PrivilegeChecker::new(None).is_privileged());
    }

    #[test]
    fn role_name_match_is_exact() {
        let lower = identity(&["admin"]);
        assert!(!PrivilegeChecker::new(Some(&lower)).is_privileged());
        assert!(PrivilegeChecker::with_role(Some(&lower), "admin").is_privileged());
    }

    #[test]
    fn self_detection_compares_ids() {
        let me = identity(&["USER"]);
        let checker = PrivilegeChecker::new(Some(&me));
        assert!(checker.is_self(UserId(7)));
        assert!(!checker.is_self(UserId(8)));
    }
}
