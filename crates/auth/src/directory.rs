//! Local identity directory (the explicit-login path).
//!
//! Credential verification is delegated to the directory; the reconciler only
//! sees "found and verified" or "rejected".

use hrportal_core::UserId;

use crate::roles::Role;

/// An account known to the local directory, with its roles attached.
#[derive(Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub roles: Vec<Role>,
    /// Expected credential; `None` accepts any credential.
    pub credential: Option<String>,
}

impl DirectoryEntry {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        roles: Vec<Role>,
    ) -> Self {
        Self {
            user_id: UserId::new(user_id),
            username: username.into(),
            display_name: display_name.into(),
            email: email.into(),
            roles,
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

impl core::fmt::Debug for DirectoryEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DirectoryEntry")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Lookup + verification contract for local login.
pub trait LocalDirectory {
    fn find_by_username(&self, username: &str) -> Option<DirectoryEntry>;

    fn verify_credential(&self, entry: &DirectoryEntry, credential: &str) -> bool;
}

/// Fixed, in-process directory.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entries: Vec<DirectoryEntry>,
}

impl StaticDirectory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self { entries }
    }
}

impl LocalDirectory for StaticDirectory {
    /// Usernames match case-insensitively after trimming.
    fn find_by_username(&self, username: &str) -> Option<DirectoryEntry> {
        let needle = username.trim();
        if needle.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| entry.username.eq_ignore_ascii_case(needle))
            .cloned()
    }

    fn verify_credential(&self, entry: &DirectoryEntry, credential: &str) -> bool {
        match &entry.credential {
            Some(expected) => expected == credential,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StaticDirectory {
        StaticDirectory::new(vec![
            DirectoryEntry::new("u-1", "admin", "Admin", "admin@example.com", vec![Role::HrAdmin]),
            DirectoryEntry::new("u-2", "pay", "Pay", "pay@example.com", vec![Role::PayrollSpecialist])
                .with_credential("s3cret"),
        ])
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let entry = directory().find_by_username(" ADMIN ").unwrap();
        assert_eq!(entry.user_id.as_str(), "u-1");
    }

    #[test]
    fn blank_username_never_matches() {
        assert!(directory().find_by_username("   ").is_none());
    }

    #[test]
    fn configured_credential_is_enforced() {
        let dir = directory();
        let entry = dir.find_by_username("pay").unwrap();
        assert!(dir.verify_credential(&entry, "s3cret"));
        assert!(!dir.verify_credential(&entry, "guess"));

        let open = dir.find_by_username("admin").unwrap();
        assert!(dir.verify_credential(&open, "anything"));
    }

    #[test]
    fn debug_output_redacts_credential() {
        let entry = directory().find_by_username("pay").unwrap();
        let rendered = format!("{entry:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
