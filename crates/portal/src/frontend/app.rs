//! Leptos application with routing.

use std::rc::Rc;

use leptos::*;
use leptos_router::*;

use hrportal_auth::{IdentityProvider, IdentityService, InMemoryIdentityProvider, KeyValueSessionStore, MemoryBackend};

use crate::config::{
    ADMIN_GATE, APPLICATION_GATE, EMPLOYEE_RECORD_GATE, HOME_PATH, LEAVE_GATE, PAYROLL_GATE, RECRUITMENT_GATE,
    TEAM_GATE, seeded_directory,
};
use crate::frontend::auth::{RequireAuth, RequireRole, provide_auth, use_auth};
use crate::frontend::nav::NavMenu;
use crate::frontend::provider::JsIdentityProvider;
use crate::frontend::storage::LocalStorageBackend;

/// Wire the identity service to the browser.
///
/// Without localStorage the session lives in memory for this page load.
/// Without the provider SDK the federated side reports "no account" so
/// guards settle instead of loading forever.
fn build_service() -> IdentityService {
    let (provider, fallback): (Rc<dyn IdentityProvider>, Option<Rc<InMemoryIdentityProvider>>) =
        match JsIdentityProvider::from_window() {
            Ok(provider) => (Rc::new(provider) as Rc<dyn IdentityProvider>, None),
            Err(err) => {
                tracing::warn!("federated sign-in disabled: {err}");
                let fallback = Rc::new(InMemoryIdentityProvider::new());
                (fallback.clone() as Rc<dyn IdentityProvider>, Some(fallback))
            }
        };

    let service = match LocalStorageBackend::from_window() {
        Ok(backend) => IdentityService::init(KeyValueSessionStore::new(backend), seeded_directory(), provider),
        Err(err) => {
            tracing::warn!("session persistence disabled: {err}");
            IdentityService::init(KeyValueSessionStore::new(MemoryBackend::new()), seeded_directory(), provider)
        }
    };

    if let Some(fallback) = fallback {
        fallback.emit(None);
    }
    service
}

/// Main application component.
#[component]
pub fn App() -> impl IntoView {
    provide_auth(build_service());

    view! {
        <Router>
            <Routes>
                <Route path="/login" view=LoginPage/>
                <Route path="/" view=Shell>
                    <Route path="" view=|| view! { <Placeholder title="Dashboard"/> }/>
                    <Route path="profile" view=ProfilePage/>
                    <Route path="leave" view=|| view! {
                        <RequireRole gate=LEAVE_GATE><Placeholder title="Leave"/></RequireRole>
                    }/>
                    <Route path="team" view=|| view! {
                        <RequireRole gate=TEAM_GATE><Placeholder title="My Team"/></RequireRole>
                    }/>
                    <Route path="applications" view=|| view! {
                        <RequireRole gate=APPLICATION_GATE><Placeholder title="My Applications"/></RequireRole>
                    }/>
                    <Route path="recruitment" view=|| view! {
                        <RequireRole gate=RECRUITMENT_GATE><Placeholder title="Recruitment"/></RequireRole>
                    }/>
                    <Route path="employees" view=|| view! {
                        <RequireRole gate=EMPLOYEE_RECORD_GATE><Placeholder title="Employees"/></RequireRole>
                    }/>
                    <Route path="payroll" view=|| view! {
                        <RequireRole gate=PAYROLL_GATE><Placeholder title="Payroll"/></RequireRole>
                    }/>
                    <Route path="admin" view=|| view! {
                        <RequireRole gate=ADMIN_GATE><Placeholder title="Administration"/></RequireRole>
                    }/>
                </Route>
            </Routes>
        </Router>
    }
}

/// Authenticated layout: header, menu and the matched child route.
#[component]
fn Shell() -> impl IntoView {
    let auth = use_auth();
    let snapshot = auth.snapshot();
    let display_name = move || {
        snapshot
            .get()
            .session
            .map(|session| session.display_name)
            .unwrap_or_default()
    };

    view! {
        <RequireAuth>
            <div class="app">
                <header>
                    <h1>"HR Portal"</h1>
                    <div class="user">
                        <span>{display_name}</span>
                        <button on:click={
                            let auth = auth.clone();
                            move |_| auth.logout()
                        }>"Sign out"</button>
                    </div>
                </header>
                <NavMenu/>
                <main>
                    <Outlet/>
                </main>
            </div>
        </RequireAuth>
    }
}

#[component]
fn LoginPage() -> impl IntoView {
    let auth = use_auth();
    let snapshot = auth.snapshot();
    let navigate = use_navigate();

    let username = create_rw_signal(String::new());
    let credential = create_rw_signal(String::new());
    let error = create_rw_signal(None::<String>);

    // Already signed in (restored or federated): go straight to the dashboard.
    create_effect(move |_| {
        if snapshot.get().session.is_some() {
            navigate(
                HOME_PATH,
                NavigateOptions {
                    replace: true,
                    ..Default::default()
                },
            );
        }
    });

    let submit = {
        let auth = auth.clone();
        move |ev: ev::SubmitEvent| {
            ev.prevent_default();
            match auth.login_local(&username.get_untracked(), &credential.get_untracked()) {
                Ok(_) => error.set(None),
                Err(err) => {
                    credential.set(String::new());
                    error.set(Some(err.to_string()));
                }
            }
        }
    };

    let federated = move |_| auth.sign_in_federated();

    view! {
        <div class="login">
            <h1>"HR Portal"</h1>
            <form on:submit=submit>
                <div class="form-group">
                    <label for="username">"Username"</label>
                    <input
                        type="text"
                        id="username"
                        prop:value=move || username.get()
                        on:input=move |ev| username.set(event_target_value(&ev))
                    />
                </div>
                <div class="form-group">
                    <label for="credential">"Password"</label>
                    <input
                        type="password"
                        id="credential"
                        prop:value=move || credential.get()
                        on:input=move |ev| credential.set(event_target_value(&ev))
                    />
                </div>
                {move || error.get().map(|message| view! { <p class="error">{message}</p> })}
                <div class="form-actions">
                    <button type="submit">"Sign in"</button>
                    <button type="button" on:click=federated>"Sign in with organisation account"</button>
                </div>
            </form>
        </div>
    }
}

#[component]
fn ProfilePage() -> impl IntoView {
    let snapshot = use_auth().snapshot();

    view! {
        <div class="profile">
            <h2>"My Profile"</h2>
            {move || {
                snapshot.get().session.map(|session| {
                    view! {
                        <dl>
                            <dt>"Name"</dt>
                            <dd>{session.display_name}</dd>
                            <dt>"Email"</dt>
                            <dd>{session.email}</dd>
                            <dt>"Roles"</dt>
                            <dd>{session.roles.to_string()}</dd>
                            <dt>"Signed in via"</dt>
                            <dd>{session.origin.as_str()}</dd>
                        </dl>
                    }
                })
            }}
        </div>
    }
}

#[component]
fn Placeholder(title: &'static str) -> impl IntoView {
    view! {
        <div class="page">
            <h2>{title}</h2>
            <p>"Nothing here yet."</p>
        </div>
    }
}
