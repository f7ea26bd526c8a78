//! Route gating for protected views.
//!
//! Each protected view owns a `RouteGuard`. It is fed an `AuthSnapshot`
//! whenever the reconciler's state changes and reports an action only when
//! its state actually transitions, so a view never redirects twice for the
//! same condition.

use crate::authority::RoleAuthority;
use crate::roles::Role;
use crate::session::AuthSnapshot;

/// Login entry point unauthenticated visitors are sent to.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GuardState {
    /// No session yet and the provider check is outstanding.
    Unresolved,
    /// A session is active (either origin).
    Authenticated,
    /// No session and the provider reported no account.
    Unauthenticated,
}

impl GuardState {
    /// An active session wins over an outstanding provider check: a restored
    /// local session cannot be displaced by the provider, so there is nothing
    /// to wait for.
    pub fn evaluate(snapshot: &AuthSnapshot) -> Self {
        if snapshot.session.is_some() {
            return GuardState::Authenticated;
        }
        if !snapshot.federated.is_resolved() {
            return GuardState::Unresolved;
        }
        // A reported account with no session is either mid-reconciliation or
        // suppressed after logout; neither grants access.
        GuardState::Unauthenticated
    }
}

/// What the protected view should do after a transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GuardAction {
    /// Neutral loading state; no redirect.
    ShowLoading,
    Render,
    /// Navigate away; `replace` drops the guarded page from history.
    Redirect { to: &'static str, replace: bool },
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    state: Option<GuardState>,
    login_path: &'static str,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self {
            state: None,
            login_path: LOGIN_PATH,
        }
    }

    pub fn with_login_path(login_path: &'static str) -> Self {
        Self {
            state: None,
            login_path,
        }
    }

    /// Current state; `None` before the first observation (not yet mounted).
    pub fn state(&self) -> Option<GuardState> {
        self.state
    }

    /// (Re)mount the view: always yields the action for the current state.
    pub fn mount(&mut self, snapshot: &AuthSnapshot) -> GuardAction {
        let state = GuardState::evaluate(snapshot);
        self.state = Some(state);
        self.action_for(state)
    }

    /// Re-evaluate after a change; `None` if the state did not transition.
    pub fn observe(&mut self, snapshot: &AuthSnapshot) -> Option<GuardAction> {
        let next = GuardState::evaluate(snapshot);
        if self.state == Some(next) {
            return None;
        }
        tracing::debug!("route guard transition {:?} -> {:?}", self.state, next);
        self.state = Some(next);
        Some(self.action_for(next))
    }

    fn action_for(&self, state: GuardState) -> GuardAction {
        match state {
            GuardState::Unresolved => GuardAction::ShowLoading,
            GuardState::Authenticated => GuardAction::Render,
            GuardState::Unauthenticated => GuardAction::Redirect {
                to: self.login_path,
                replace: true,
            },
        }
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Role requirement for a view inside an authenticated area.
///
/// An empty requirement admits any authenticated session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RoleGate {
    required: &'static [Role],
}

impl RoleGate {
    pub const fn any_of(required: &'static [Role]) -> Self {
        Self { required }
    }

    pub fn permits(&self, authority: &RoleAuthority<'_>) -> bool {
        if self.required.is_empty() {
            return authority.is_authenticated();
        }
        authority.has_any_role(self.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryEntry;
    use crate::provider::{Account, FederatedStatus};
    use crate::session::Session;

    fn snapshot(session: Option<Session>, federated: FederatedStatus) -> AuthSnapshot {
        AuthSnapshot { session, federated }
    }

    fn local() -> Session {
        Session::local(&DirectoryEntry::new("u", "u", "U", "u@x.com", vec![Role::LineManager]))
    }

    #[test]
    fn evaluate_covers_all_states() {
        assert_eq!(
            GuardState::evaluate(&snapshot(None, FederatedStatus::Unresolved)),
            GuardState::Unresolved
        );
        assert_eq!(
            GuardState::evaluate(&snapshot(None, FederatedStatus::SignedOut)),
            GuardState::Unauthenticated
        );
        assert_eq!(
            GuardState::evaluate(&snapshot(Some(local()), FederatedStatus::Unresolved)),
            GuardState::Authenticated
        );
        let federated = Session::federated(&Account::new("abc", "u@x.com"));
        assert_eq!(
            GuardState::evaluate(&snapshot(Some(federated), FederatedStatus::SignedOut)),
            GuardState::Authenticated
        );
    }

    #[test]
    fn reported_account_without_session_redirects() {
        let suppressed = snapshot(None, FederatedStatus::SignedIn(Account::new("abc", "u@x.com")));
        assert_eq!(GuardState::evaluate(&suppressed), GuardState::Unauthenticated);

        let mut guard = RouteGuard::new();
        assert_eq!(
            guard.mount(&suppressed),
            GuardAction::Redirect { to: LOGIN_PATH, replace: true }
        );

        // Coming from a loading state, the same snapshot ends the wait with a redirect.
        let mut waiting = RouteGuard::new();
        assert_eq!(waiting.mount(&AuthSnapshot::default()), GuardAction::ShowLoading);
        assert_eq!(
            waiting.observe(&suppressed),
            Some(GuardAction::Redirect { to: LOGIN_PATH, replace: true })
        );
    }

    #[test]
    fn unresolved_mount_waits_then_redirects_once() {
        let mut guard = RouteGuard::new();
        assert_eq!(guard.mount(&AuthSnapshot::default()), GuardAction::ShowLoading);

        // Still unresolved: nothing to do.
        assert_eq!(guard.observe(&AuthSnapshot::default()), None);

        let signed_out = snapshot(None, FederatedStatus::SignedOut);
        assert_eq!(
            guard.observe(&signed_out),
            Some(GuardAction::Redirect { to: LOGIN_PATH, replace: true })
        );
        assert_eq!(guard.observe(&signed_out), None);
        assert_eq!(guard.state(), Some(GuardState::Unauthenticated));
    }

    #[test]
    fn session_change_re_evaluates() {
        let mut guard = RouteGuard::with_login_path("/signin");
        assert_eq!(
            guard.mount(&snapshot(Some(local()), FederatedStatus::SignedOut)),
            GuardAction::Render
        );
        assert_eq!(
            guard.observe(&snapshot(None, FederatedStatus::SignedOut)),
            Some(GuardAction::Redirect { to: "/signin", replace: true })
        );
    }

    #[test]
    fn role_gate_checks_any_of() {
        const PAYROLL: RoleGate = RoleGate::any_of(&[Role::PayrollSpecialist, Role::HrAdmin]);
        const OPEN: RoleGate = RoleGate::any_of(&[]);

        let session = local();
        let authority = RoleAuthority::new(Some(&session));
        assert!(!PAYROLL.permits(&authority));
        assert!(OPEN.permits(&authority));
        assert!(!OPEN.permits(&RoleAuthority::new(None)));
    }
}
