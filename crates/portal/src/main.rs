//! Session maintenance tool.
//!
//! Inspects or changes the persisted portal session without a browser:
//!
//! ```text
//! hrportal-session show
//! hrportal-session login <username> [credential]
//! hrportal-session logout
//! hrportal-session clear
//! ```

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::rc::Rc;

    use anyhow::{Context, bail};
    use hrportal_auth::{
        IdentityService, InMemoryIdentityProvider, KeyValueSessionStore, RoleAuthority, SessionStore,
        filter_for,
    };
    use hrportal_portal::{NAVIGATION, PortalConfig, SqliteSessionBackend, seeded_directory};

    const USAGE: &str = "usage: hrportal-session <show | login <username> [credential] | logout | clear>";

    pub fn run() -> anyhow::Result<()> {
        hrportal_observability::init();

        let config = PortalConfig::from_env()?;
        tracing::info!(path = %config.session_db.display(), "opening session database");

        let backend = SqliteSessionBackend::open(&config.session_db)?;
        let args: Vec<String> = std::env::args().skip(1).collect();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match args.as_slice() {
            ["show"] | [] => show(backend),
            ["clear"] => {
                KeyValueSessionStore::new(backend).clear().context("failed to clear session")?;
                println!("session cleared");
                Ok(())
            }
            ["login", username] => login(backend, username, ""),
            ["login", username, credential] => login(backend, username, credential),
            ["logout"] => logout(backend),
            _ => bail!(USAGE),
        }
    }

    fn service(backend: SqliteSessionBackend) -> IdentityService {
        let provider = Rc::new(InMemoryIdentityProvider::new());
        let service = IdentityService::init(KeyValueSessionStore::new(backend), seeded_directory(), provider.clone());
        // No federated provider here: report "no account" so the status resolves.
        provider.emit(None);
        service
    }

    fn show(backend: SqliteSessionBackend) -> anyhow::Result<()> {
        let service = service(backend);
        let snapshot = service.snapshot();
        match &snapshot.session {
            Some(session) => {
                println!("user:    {} ({})", session.display_name, session.user_id);
                println!("email:   {}", session.email);
                println!("origin:  {}", session.origin.as_str());
                println!("roles:   {}", session.roles);
                let authority = RoleAuthority::new(Some(session));
                let menu: Vec<&str> = filter_for(NAVIGATION, &authority)
                    .into_iter()
                    .map(|item| item.label)
                    .collect();
                println!("menu:    {}", menu.join(", "));
            }
            None => println!("no active session"),
        }
        service.shutdown();
        Ok(())
    }

    fn login(backend: SqliteSessionBackend, username: &str, credential: &str) -> anyhow::Result<()> {
        let service = service(backend);
        let session = service
            .login_local(username, credential)
            .with_context(|| format!("login failed for {username:?}"))?;
        println!("signed in as {} [{}]", session.display_name, session.roles);
        service.shutdown();
        Ok(())
    }

    fn logout(backend: SqliteSessionBackend) -> anyhow::Result<()> {
        let service = service(backend);
        // The local provider never holds an account, so no provider sign-out is requested.
        let outcome = service.logout();
        if outcome.cleared.is_some() {
            println!("signed out");
        } else {
            println!("no active session");
        }
        service.shutdown();
        Ok(())
    }
}
