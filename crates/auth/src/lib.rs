//! `hrportal-auth`
//!
//! Identity and role-authorization core of the HR portal.
//!
//! Reconciles a local credential login and a federated identity provider
//! into one session, persists it, and answers role, route and navigation
//! questions from it. No UI or concrete storage medium lives here.

pub mod authority;
pub mod directory;
pub mod guard;
pub mod navigation;
pub mod provider;
pub mod reconciler;
pub mod roles;
pub mod service;
pub mod session;
pub mod store;

pub use authority::RoleAuthority;
pub use directory::{DirectoryEntry, LocalDirectory, StaticDirectory};
pub use guard::{GuardAction, GuardState, LOGIN_PATH, RoleGate, RouteGuard};
pub use navigation::{NavigationItem, filter, filter_for};
pub use provider::{
    Account, FederatedStatus, IdentityProvider, InMemoryIdentityProvider, ListenerId, ProviderError,
    StatusListener,
};
pub use reconciler::{FederatedDecision, IdentityReconciler, LoginError, LogoutOutcome, SignOutTask};
pub use roles::{Role, RoleSet};
pub use service::{IdentityService, WatchId};
pub use session::{AuthSnapshot, Session, SessionOrigin};
pub use store::{
    KeyValueBackend, KeyValueSessionStore, MemoryBackend, ORIGIN_KEY, SESSION_KEY, SessionStore, StoreError,
};
