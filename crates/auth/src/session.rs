//! The canonical authenticated-identity record.

use serde::{Deserialize, Serialize};

use hrportal_core::{DomainError, UserId};

use crate::authority::RoleAuthority;
use crate::directory::DirectoryEntry;
use crate::provider::{Account, FederatedStatus};
use crate::roles::{Role, RoleSet};

/// Which authentication path produced a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOrigin {
    /// Explicit credential login against the local directory.
    Local,
    /// Resolution of an account at the federated identity provider.
    Federated,
}

impl SessionOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOrigin::Local => "local",
            SessionOrigin::Federated => "federated",
        }
    }
}

impl core::fmt::Display for SessionOrigin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for SessionOrigin {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "local" => Ok(SessionOrigin::Local),
            "federated" => Ok(SessionOrigin::Federated),
            other => Err(DomainError::validation(format!("unknown session origin '{other}'"))),
        }
    }
}

/// The authoritative authenticated identity.
///
/// # Invariants
/// - `roles` is never empty (enforced by `RoleSet`).
/// - Only the reconciler creates or replaces a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub display_name: String,
    pub email: String,
    pub roles: RoleSet,
    pub origin: SessionOrigin,
}

impl Session {
    /// Materialize a session from a verified local directory entry.
    pub fn local(entry: &DirectoryEntry) -> Self {
        Self {
            user_id: entry.user_id.clone(),
            display_name: entry.display_name.clone(),
            email: entry.email.clone(),
            roles: RoleSet::or_baseline(entry.roles.iter().copied()),
            origin: SessionOrigin::Local,
        }
    }

    /// Materialize a session from a provider account.
    ///
    /// The provider carries no application roles, so the session gets the
    /// baseline role only.
    pub fn federated(account: &Account) -> Self {
        Self {
            user_id: UserId::from(account.id.clone()),
            display_name: account
                .name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| account.username.clone()),
            email: account.username.clone(),
            roles: RoleSet::baseline(),
            origin: SessionOrigin::Federated,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_local(&self) -> bool {
        self.origin == SessionOrigin::Local
    }

    /// True if this federated session belongs to `account`.
    pub fn belongs_to(&self, account: &Account) -> bool {
        self.origin == SessionOrigin::Federated && self.user_id.as_str() == account.id.as_str()
    }
}

/// Point-in-time view of the reconciler state handed to readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub session: Option<Session>,
    pub federated: FederatedStatus,
}

impl AuthSnapshot {
    pub fn authority(&self) -> RoleAuthority<'_> {
        RoleAuthority::new(self.session.as_ref())
    }
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            session: None,
            federated: FederatedStatus::Unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrportal_core::AccountId;

    fn account(name: Option<&str>) -> Account {
        Account {
            id: AccountId::new("abc"),
            username: "u@x.com".to_string(),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn federated_session_gets_baseline_role_only() {
        let session = Session::federated(&account(None));
        assert_eq!(session.origin, SessionOrigin::Federated);
        assert_eq!(session.roles, RoleSet::single(Role::Employee));
        assert_eq!(session.user_id.as_str(), "abc");
        assert_eq!(session.display_name, "u@x.com");
        assert!(session.belongs_to(&account(None)));
    }

    #[test]
    fn federated_session_prefers_account_name() {
        let session = Session::federated(&account(Some("Una Example")));
        assert_eq!(session.display_name, "Una Example");
        assert_eq!(session.email, "u@x.com");
    }

    #[test]
    fn local_session_without_roles_defaults_to_baseline() {
        let entry = DirectoryEntry::new("e-1", "sam", "Sam", "sam@example.com", vec![]);
        let session = Session::local(&entry);
        assert!(session.is_local());
        assert!(session.has_role(Role::Employee));
        assert_eq!(session.roles.len(), 1);
    }

    #[test]
    fn origin_tag_round_trips_through_str() {
        for origin in [SessionOrigin::Local, SessionOrigin::Federated] {
            assert_eq!(origin.as_str().parse::<SessionOrigin>().unwrap(), origin);
        }
        assert!("sso".parse::<SessionOrigin>().is_err());
    }
}
