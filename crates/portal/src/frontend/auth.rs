//! Auth context and route guard components.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::*;
use leptos_router::*;

use hrportal_auth::{AuthSnapshot, GuardAction, IdentityService, LoginError, RoleGate, RouteGuard, Session};

/// Identity service handle plus a reactive copy of its state.
#[derive(Clone)]
pub struct AuthContext {
    service: IdentityService,
    snapshot: RwSignal<AuthSnapshot>,
}

impl AuthContext {
    pub fn new(service: IdentityService) -> Self {
        let snapshot = create_rw_signal(service.snapshot());
        service.watch(move |next| snapshot.set(next.clone()));
        Self { service, snapshot }
    }

    pub fn snapshot(&self) -> ReadSignal<AuthSnapshot> {
        self.snapshot.read_only()
    }

    pub fn login_local(&self, username: &str, credential: &str) -> Result<Session, LoginError> {
        self.service.login_local(username, credential)
    }

    /// Clear the session now; the provider sign-out (if any) runs in the
    /// background.
    pub fn logout(&self) {
        let outcome = self.service.logout();
        if let Some(task) = outcome.sign_out {
            spawn_local(async move {
                // Failure is already logged by the task.
                let _ = task.run().await;
            });
        }
    }

    pub fn sign_in_federated(&self) {
        let service = self.service.clone();
        spawn_local(async move {
            let _ = service.sign_in_federated().await;
        });
    }
}

pub fn provide_auth(service: IdentityService) -> AuthContext {
    let auth = AuthContext::new(service);
    provide_context(auth.clone());
    auth
}

pub fn use_auth() -> AuthContext {
    expect_context::<AuthContext>()
}

/// Renders `children` only for an authenticated session.
///
/// Shows a loading state while the provider has not reported and redirects
/// (replacing the history entry) once the user is known to be signed out.
#[component]
pub fn RequireAuth(children: ChildrenFn) -> impl IntoView {
    let snapshot = use_auth().snapshot();
    let navigate = use_navigate();

    let guard = Rc::new(RefCell::new(RouteGuard::new()));
    let action = create_rw_signal(guard.borrow_mut().mount(&snapshot.get_untracked()));

    create_effect(move |_| {
        let current = snapshot.get();
        if let Some(next) = guard.borrow_mut().observe(&current) {
            action.set(next);
        }
    });

    create_effect(move |_| {
        if let GuardAction::Redirect { to, replace } = action.get() {
            navigate(
                to,
                NavigateOptions {
                    replace,
                    ..Default::default()
                },
            );
        }
    });

    move || match action.get() {
        GuardAction::ShowLoading => view! { <p class="loading">"Checking your session..."</p> }.into_view(),
        GuardAction::Render => children().into_view(),
        GuardAction::Redirect { .. } => ().into_view(),
    }
}

/// Renders `children` only if the session holds one of the gate's roles.
#[component]
pub fn RequireRole(gate: RoleGate, children: ChildrenFn) -> impl IntoView {
    let snapshot = use_auth().snapshot();

    move || {
        if gate.permits(&snapshot.get().authority()) {
            children().into_view()
        } else {
            view! {
                <div class="access-denied">
                    <h2>"Access denied"</h2>
                    <p>"Your roles do not grant access to this page."</p>
                    <A href=crate::config::HOME_PATH>"Back to dashboard"</A>
                </div>
            }
            .into_view()
        }
    }
}
