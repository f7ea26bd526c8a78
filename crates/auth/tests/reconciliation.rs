//! Black-box reconciliation scenarios through the public service API.
//!
//! Covers: local login precedence, federated baseline sessions, logout with
//! provider sign-out, persistence round trips and navigation filtering.

use std::rc::Rc;

use hrportal_auth::{
    Account, DirectoryEntry, FederatedStatus, GuardAction, GuardState, IdentityService, InMemoryIdentityProvider,
    KeyValueSessionStore, LOGIN_PATH, LoginError, MemoryBackend, NavigationItem, Role, RoleSet, RouteGuard,
    SessionOrigin, SessionStore, StaticDirectory, filter,
};

struct Harness {
    service: IdentityService,
    backend: Rc<MemoryBackend>,
    provider: Rc<InMemoryIdentityProvider>,
}

fn directory() -> StaticDirectory {
    StaticDirectory::new(vec![
        DirectoryEntry::new(
            "u-admin",
            "admin",
            "Ada Admin",
            "admin@example.com",
            vec![Role::HrAdmin, Role::SystemAdmin],
        ),
        DirectoryEntry::new("u-lm", "manager", "Mo Manager", "mo@example.com", vec![Role::LineManager]),
    ])
}

fn harness_with(provider: InMemoryIdentityProvider, backend: Rc<MemoryBackend>) -> Harness {
    let provider = Rc::new(provider);
    let service = IdentityService::init(
        KeyValueSessionStore::new(Rc::clone(&backend)),
        directory(),
        provider.clone(),
    );
    Harness {
        service,
        backend,
        provider,
    }
}

fn harness() -> Harness {
    harness_with(InMemoryIdentityProvider::new(), Rc::new(MemoryBackend::new()))
}

#[test]
fn admin_local_login() {
    let h = harness();
    let session = h.service.login_local("admin", "anything").unwrap();

    assert_eq!(session.origin, SessionOrigin::Local);
    assert!(h.service.has_role(Role::HrAdmin));
    assert!(h.service.has_role(Role::SystemAdmin));
    assert!(!h.service.has_role(Role::Employee));
}

#[test]
fn federated_account_without_session() {
    let h = harness();
    h.provider.emit(Some(Account::new("abc", "u@x.com")));

    let session = h.service.session().expect("federated session");
    assert_eq!(session.origin, SessionOrigin::Federated);
    assert_eq!(session.roles, RoleSet::single(Role::Employee));
}

#[test]
fn late_federated_signal_does_not_displace_local_login() {
    let h = harness();
    let before = h.service.login_local("admin", "x").unwrap();
    let writes = h.backend.write_count();

    h.provider.emit(Some(Account::new("zzz", "other")));
    h.provider.emit(None);
    h.provider.emit(Some(Account::new("abc", "u@x.com")));

    let after = h.service.session().unwrap();
    assert_eq!(after.user_id, before.user_id);
    assert_eq!(after.origin, before.origin);
    assert_eq!(after.roles, before.roles);
    assert_eq!(h.backend.write_count(), writes);
}

#[tokio::test]
async fn federated_logout_requests_exactly_one_sign_out() {
    let h = harness();
    h.provider.emit(Some(Account::new("abc", "u@x.com")));
    assert!(h.service.session().is_some());

    let outcome = h.service.logout();
    assert!(h.backend.is_empty());
    assert!(h.service.session().is_none());

    let task = outcome.sign_out.expect("sign-out requested");
    task.run().await.unwrap();
    assert_eq!(h.provider.sign_out_requests(), 1);
    assert_eq!(h.service.snapshot().federated, FederatedStatus::SignedOut);
    assert_eq!(h.service.guard_state(), GuardState::Unauthenticated);
}

#[tokio::test]
async fn failed_provider_sign_out_never_restores_session() {
    let h = harness();
    h.provider.emit(Some(Account::new("abc", "u@x.com")));
    h.provider.set_fail_sign_out(true);

    let outcome = h.service.logout();
    let result = outcome.sign_out.expect("sign-out requested").run().await;
    assert!(result.is_err());

    // The provider still holds the account and re-announces it.
    h.provider.emit(Some(Account::new("abc", "u@x.com")));
    assert!(h.service.session().is_none());
    assert!(h.backend.is_empty());
    assert!(Role::ALL.iter().all(|role| !h.service.has_role(*role)));

    // The account is known but suppressed: redirect to login, never a loading state.
    assert_eq!(
        h.service.snapshot().federated,
        FederatedStatus::SignedIn(Account::new("abc", "u@x.com"))
    );
    assert_eq!(h.service.guard_state(), GuardState::Unauthenticated);
    let mut guard = RouteGuard::new();
    assert_eq!(
        guard.mount(&h.service.snapshot()),
        GuardAction::Redirect { to: LOGIN_PATH, replace: true }
    );
}

#[test]
fn unknown_username_leaves_state_unchanged() {
    let h = harness();
    h.provider.emit(Some(Account::new("abc", "u@x.com")));
    let before = h.service.snapshot();

    assert_eq!(h.service.login_local("nobody", "pw"), Err(LoginError::InvalidCredentials));
    assert_eq!(h.service.snapshot(), before);
}

#[test]
fn logout_clears_every_role_regardless_of_origin() {
    let h = harness();
    h.service.login_local("manager", "x").unwrap();
    h.service.logout();
    assert!(Role::ALL.iter().all(|role| !h.service.has_role(*role)));

    h.provider.emit(None);
    h.provider.emit(Some(Account::new("abc", "u@x.com")));
    assert!(h.service.has_role(Role::Employee));
    h.service.logout();
    assert!(Role::ALL.iter().all(|role| !h.service.has_role(*role)));
}

#[test]
fn persisted_local_session_survives_reload() {
    let backend = Rc::new(MemoryBackend::new());
    let first = harness_with(InMemoryIdentityProvider::new(), Rc::clone(&backend));
    let session = first.service.login_local("admin", "x").unwrap();
    first.service.shutdown();
    drop(first);

    let store = KeyValueSessionStore::new(Rc::clone(&backend));
    assert_eq!(store.load().unwrap(), Some(session.clone()));

    // A restarted service is authenticated before the provider reports.
    let second = harness_with(InMemoryIdentityProvider::new(), backend);
    assert_eq!(second.service.session(), Some(session));
    assert_eq!(second.service.guard_state(), GuardState::Authenticated);
}

#[test]
fn persisted_federated_session_waits_for_provider() {
    let backend = Rc::new(MemoryBackend::new());
    let first = harness_with(InMemoryIdentityProvider::new(), Rc::clone(&backend));
    first.provider.emit(Some(Account::new("abc", "u@x.com")));
    drop(first);

    let second = harness_with(InMemoryIdentityProvider::new(), backend);
    assert!(second.service.session().is_none());
    assert_eq!(second.service.guard_state(), GuardState::Unresolved);

    second.provider.emit(None);
    assert_eq!(second.service.guard_state(), GuardState::Unauthenticated);
}

#[test]
fn payroll_menu_hidden_from_line_manager() {
    let h = harness();
    let session = h.service.login_local("manager", "x").unwrap();
    let items = [
        NavigationItem::new("Payroll", "/payroll").restricted_to(&[Role::PayrollSpecialist]),
        NavigationItem::new("Profile", "/profile"),
    ];

    let visible = filter(&items, Some(&session));
    assert_eq!(visible, vec![&items[1]]);
}
