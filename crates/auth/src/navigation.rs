//! Role-filtered navigation menu.

use crate::authority::RoleAuthority;
use crate::roles::{Role, RoleSet};
use crate::session::Session;

/// A static menu entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NavigationItem {
    pub label: &'static str,
    pub path: &'static str,
    /// `None` = visible to any authenticated session.
    pub allowed_roles: Option<&'static [Role]>,
}

impl NavigationItem {
    pub const fn new(label: &'static str, path: &'static str) -> Self {
        Self {
            label,
            path,
            allowed_roles: None,
        }
    }

    pub const fn restricted_to(mut self, roles: &'static [Role]) -> Self {
        self.allowed_roles = Some(roles);
        self
    }

    /// One matching role is sufficient.
    pub fn is_visible_to(&self, roles: &RoleSet) -> bool {
        match self.allowed_roles {
            None => true,
            Some(allowed) => roles.intersects(allowed),
        }
    }
}

/// Visible subset of `items` for `session`, in input order.
///
/// Without a session nothing is visible.
pub fn filter<'a>(items: &'a [NavigationItem], session: Option<&Session>) -> Vec<&'a NavigationItem> {
    let Some(session) = session else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_visible_to(&session.roles))
        .collect()
}

/// Same as [`filter`], over the role query surface.
pub fn filter_for<'a>(items: &'a [NavigationItem], authority: &RoleAuthority<'_>) -> Vec<&'a NavigationItem> {
    filter(items, authority.session())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryEntry;
    use proptest::prelude::*;

    const ITEMS: [NavigationItem; 5] = [
        NavigationItem::new("Dashboard", "/"),
        NavigationItem::new("Payroll", "/payroll").restricted_to(&[Role::PayrollSpecialist]),
        NavigationItem::new("Team", "/team").restricted_to(&[Role::LineManager, Role::HrAdmin]),
        NavigationItem::new("Profile", "/profile"),
        NavigationItem::new("Administration", "/admin").restricted_to(&[Role::SystemAdmin]),
    ];

    fn session_with(roles: Vec<Role>) -> Session {
        Session::local(&DirectoryEntry::new("u", "u", "U", "u@x.com", roles))
    }

    #[test]
    fn payroll_hidden_from_line_manager() {
        let items = [
            NavigationItem::new("Payroll", "/payroll").restricted_to(&[Role::PayrollSpecialist]),
            NavigationItem::new("Profile", "/profile"),
        ];
        let session = session_with(vec![Role::LineManager]);

        let visible = filter(&items, Some(&session));
        let labels: Vec<&str> = visible.iter().map(|item| item.label).collect();
        assert_eq!(labels, vec!["Profile"]);
    }

    #[test]
    fn one_matching_role_is_enough() {
        let session = session_with(vec![Role::HrAdmin]);
        let labels: Vec<&str> = filter(&ITEMS, Some(&session)).iter().map(|i| i.label).collect();
        assert_eq!(labels, vec!["Dashboard", "Team", "Profile"]);
    }

    #[test]
    fn nothing_visible_without_session() {
        assert!(filter(&ITEMS, None).is_empty());
        assert!(filter_for(&ITEMS, &RoleAuthority::new(None)).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: output is an order-preserving subset that always keeps unrestricted items.
        #[test]
        fn filter_is_ordered_subset(mask in 1u8..64u8) {
            let roles: Vec<Role> = Role::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, role)| *role)
                .collect();
            let session = session_with(roles);
            let visible = filter(&ITEMS, Some(&session));

            let mut cursor = 0;
            for item in &visible {
                let position = ITEMS[cursor..].iter().position(|candidate| candidate == *item);
                prop_assert!(position.is_some());
                cursor += position.unwrap_or(0) + 1;
            }

            for item in ITEMS.iter().filter(|item| item.allowed_roles.is_none()) {
                prop_assert!(visible.contains(&item));
            }
        }
    }
}
