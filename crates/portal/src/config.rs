//! Portal configuration: static navigation, route role requirements, the
//! seeded local directory, and (native) environment-driven settings.

use hrportal_auth::{DirectoryEntry, NavigationItem, Role, RoleGate, StaticDirectory};

pub const HOME_PATH: &str = "/";

pub const LEAVE_ROLES: &[Role] = &[Role::Employee, Role::LineManager];
pub const TEAM_ROLES: &[Role] = &[Role::LineManager, Role::HrAdmin];
pub const APPLICATION_ROLES: &[Role] = &[Role::Applicant];
pub const RECRUITMENT_ROLES: &[Role] = &[Role::HrAdmin, Role::LineManager];
pub const EMPLOYEE_RECORD_ROLES: &[Role] = &[Role::HrAdmin];
pub const PAYROLL_ROLES: &[Role] = &[Role::PayrollSpecialist, Role::HrAdmin];
pub const ADMIN_ROLES: &[Role] = &[Role::SystemAdmin];

pub const LEAVE_GATE: RoleGate = RoleGate::any_of(LEAVE_ROLES);
pub const TEAM_GATE: RoleGate = RoleGate::any_of(TEAM_ROLES);
pub const APPLICATION_GATE: RoleGate = RoleGate::any_of(APPLICATION_ROLES);
pub const RECRUITMENT_GATE: RoleGate = RoleGate::any_of(RECRUITMENT_ROLES);
pub const EMPLOYEE_RECORD_GATE: RoleGate = RoleGate::any_of(EMPLOYEE_RECORD_ROLES);
pub const PAYROLL_GATE: RoleGate = RoleGate::any_of(PAYROLL_ROLES);
pub const ADMIN_GATE: RoleGate = RoleGate::any_of(ADMIN_ROLES);

/// Main menu, in display order.
pub static NAVIGATION: &[NavigationItem] = &[
    NavigationItem::new("Dashboard", HOME_PATH),
    NavigationItem::new("My Profile", "/profile"),
    NavigationItem::new("Leave", "/leave").restricted_to(LEAVE_ROLES),
    NavigationItem::new("My Team", "/team").restricted_to(TEAM_ROLES),
    NavigationItem::new("My Applications", "/applications").restricted_to(APPLICATION_ROLES),
    NavigationItem::new("Recruitment", "/recruitment").restricted_to(RECRUITMENT_ROLES),
    NavigationItem::new("Employees", "/employees").restricted_to(EMPLOYEE_RECORD_ROLES),
    NavigationItem::new("Payroll", "/payroll").restricted_to(PAYROLL_ROLES),
    NavigationItem::new("Administration", "/admin").restricted_to(ADMIN_ROLES),
];

/// Fixed local identity directory shipped with the portal.
///
/// Entries carry no credential, so the directory only checks that the
/// username exists; real credential checks belong to the backend.
pub fn seeded_directory() -> StaticDirectory {
    StaticDirectory::new(vec![
        DirectoryEntry::new(
            "local-admin",
            "admin",
            "Portal Administrator",
            "admin@hrportal.local",
            vec![Role::HrAdmin, Role::SystemAdmin],
        ),
        DirectoryEntry::new(
            "local-hr",
            "hr",
            "HR Officer",
            "hr@hrportal.local",
            vec![Role::HrAdmin, Role::Employee],
        ),
        DirectoryEntry::new(
            "local-manager",
            "manager",
            "Line Manager",
            "manager@hrportal.local",
            vec![Role::LineManager, Role::Employee],
        ),
        DirectoryEntry::new(
            "local-payroll",
            "payroll",
            "Payroll Specialist",
            "payroll@hrportal.local",
            vec![Role::PayrollSpecialist, Role::Employee],
        ),
        DirectoryEntry::new(
            "local-employee",
            "employee",
            "Staff Member",
            "employee@hrportal.local",
            vec![Role::Employee],
        ),
        DirectoryEntry::new(
            "local-applicant",
            "applicant",
            "Job Applicant",
            "applicant@hrportal.local",
            vec![Role::Applicant],
        ),
    ])
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::{PortalConfig, SESSION_DB_ENV};

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use anyhow::Context;

    /// Environment variable overriding the SQLite session database path.
    pub const SESSION_DB_ENV: &str = "HRPORTAL_SESSION_DB";

    /// Native runtime settings.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PortalConfig {
        pub session_db: PathBuf,
    }

    impl PortalConfig {
        /// Read settings from the environment, falling back to defaults.
        pub fn from_env() -> anyhow::Result<Self> {
            let session_db = match std::env::var_os(SESSION_DB_ENV) {
                Some(path) if !path.is_empty() => PathBuf::from(path),
                _ => default_session_db_path()?,
            };
            Ok(Self { session_db })
        }
    }

    /// `{app_data_dir}/hrportal/session.db`.
    fn default_session_db_path() -> anyhow::Result<PathBuf> {
        let mut dir = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut h| {
                    h.push(".local");
                    h.push("share");
                    h
                })
            })
            .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

        dir.push("hrportal");
        dir.push("session.db");
        Ok(dir)
    }
}
