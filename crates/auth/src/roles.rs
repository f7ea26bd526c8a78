use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use hrportal_core::{DomainError, DomainResult};

/// Role identifier used for navigation and route gating.
///
/// The set is closed: an unrecognised role name is a parse error, so a typo
/// in configuration cannot silently turn into a `false` from `has_role`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Applicant,
    LineManager,
    HrAdmin,
    PayrollSpecialist,
    SystemAdmin,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Employee,
        Role::Applicant,
        Role::LineManager,
        Role::HrAdmin,
        Role::PayrollSpecialist,
        Role::SystemAdmin,
    ];

    /// Role granted to every federated session (the provider carries no roles).
    pub const BASELINE: Role = Role::Employee;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Applicant => "applicant",
            Role::LineManager => "line_manager",
            Role::HrAdmin => "hr_admin",
            Role::PayrollSpecialist => "payroll_specialist",
            Role::SystemAdmin => "system_admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| DomainError::unknown_role(needle))
    }
}

/// Non-empty set of roles attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// Build a role set, rejecting an empty one.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> DomainResult<Self> {
        let set: BTreeSet<Role> = roles.into_iter().collect();
        if set.is_empty() {
            return Err(DomainError::validation("role set cannot be empty"));
        }
        Ok(Self(set))
    }

    /// Build a role set, falling back to `{employee}` when `roles` is empty.
    pub fn or_baseline(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::new(roles).unwrap_or_else(|_| Self::baseline())
    }

    pub fn baseline() -> Self {
        Self::single(Role::BASELINE)
    }

    pub fn single(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// True if at least one of `roles` is held (union semantics).
    pub fn intersects(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.0.contains(role))
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<Role>> for RoleSet {
    type Error = DomainError;

    fn try_from(value: Vec<Role>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(value: RoleSet) -> Self {
        value.0.into_iter().collect()
    }
}

impl core::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}
