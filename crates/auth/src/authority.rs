//! Role queries over the current session.

use crate::roles::{Role, RoleSet};
use crate::session::Session;

/// Read-only role query surface.
///
/// Borrows the session rather than copying its roles, so answers always
/// reflect the reconciler's latest state.
#[derive(Debug, Clone, Copy)]
pub struct RoleAuthority<'a> {
    session: Option<&'a Session>,
}

impl<'a> RoleAuthority<'a> {
    pub fn new(session: Option<&'a Session>) -> Self {
        Self { session }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// True iff a session is active and holds `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.session.is_some_and(|session| session.has_role(role))
    }

    /// True iff a session is active and holds at least one of `roles`.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.session.is_some_and(|session| session.roles.intersects(roles))
    }

    pub fn roles(&self) -> Option<&'a RoleSet> {
        self.session.map(|session| &session.roles)
    }

    pub fn session(&self) -> Option<&'a Session> {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryEntry;
    use proptest::prelude::*;

    fn session_with(roles: Vec<Role>) -> Session {
        Session::local(&DirectoryEntry::new("u", "u", "U", "u@example.com", roles))
    }

    #[test]
    fn no_session_has_no_roles() {
        let authority = RoleAuthority::new(None);
        assert!(!authority.is_authenticated());
        assert!(Role::ALL.iter().all(|role| !authority.has_role(*role)));
        assert!(!authority.has_any_role(&Role::ALL));
        assert!(authority.roles().is_none());
    }

    #[test]
    fn admin_scenario() {
        let session = session_with(vec![Role::HrAdmin, Role::SystemAdmin]);
        let authority = RoleAuthority::new(Some(&session));
        assert!(authority.has_role(Role::HrAdmin));
        assert!(!authority.has_role(Role::Employee));
        assert!(authority.has_any_role(&[Role::Employee, Role::SystemAdmin]));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: with a session active, has_role(r) holds exactly for r in the role set.
        #[test]
        fn has_role_matches_membership(mask in 1u8..64u8) {
            let roles: Vec<Role> = Role::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, role)| *role)
                .collect();
            let session = session_with(roles.clone());
            let authority = RoleAuthority::new(Some(&session));

            for role in Role::ALL {
                prop_assert_eq!(authority.has_role(role), roles.contains(&role));
            }
        }
    }
}
