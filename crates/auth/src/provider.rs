//! Federated identity provider capability interface.
//!
//! The provider's protocol, token handling and cryptography live outside this
//! crate. The core only consumes the status queries, the two interactive
//! operations, and a status-change subscription.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hrportal_core::AccountId;

/// An account as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Account {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(id),
            username: username.into(),
            name: None,
        }
    }
}

/// Last known federated authentication status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FederatedStatus {
    /// The provider's asynchronous check is outstanding.
    #[default]
    Unresolved,
    SignedIn(Account),
    SignedOut,
}

impl FederatedStatus {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, FederatedStatus::Unresolved)
    }

    pub fn account(&self) -> Option<&Account> {
        match self {
            FederatedStatus::SignedIn(account) => Some(account),
            _ => None,
        }
    }
}

impl From<Option<Account>> for FederatedStatus {
    fn from(value: Option<Account>) -> Self {
        match value {
            Some(account) => FederatedStatus::SignedIn(account),
            None => FederatedStatus::SignedOut,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("interactive sign-in failed: {0}")]
    SignInFailed(String),

    #[error("provider sign-out failed: {0}")]
    SignOutFailed(String),

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Callback invoked with the provider's current account whenever its
/// authentication status resolves or changes.
pub type StatusListener = Box<dyn Fn(Option<Account>)>;

/// Handle returned by `IdentityProvider::subscribe`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Capability interface of the federated identity provider.
///
/// Single-threaded (UI event loop), hence `?Send`.
#[async_trait(?Send)]
pub trait IdentityProvider {
    fn is_authenticated(&self) -> bool;

    fn current_accounts(&self) -> Vec<Account>;

    async fn sign_in_interactive(&self) -> Result<(), ProviderError>;

    async fn sign_out_interactive(&self) -> Result<(), ProviderError>;

    fn subscribe(&self, listener: StatusListener) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId);
}

/// In-memory provider for tests/dev.
///
/// - No IO
/// - Listeners are notified synchronously from `emit`
/// - Counts interactive requests so callers can assert on them
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: RefCell<Vec<Account>>,
    listeners: RefCell<Vec<(ListenerId, Rc<dyn Fn(Option<Account>)>)>>,
    next_listener: Cell<u64>,
    interactive_account: RefCell<Option<Account>>,
    fail_sign_out: Cell<bool>,
    sign_in_requests: Cell<usize>,
    sign_out_requests: Cell<usize>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that already holds `account` (e.g. a cached provider session).
    pub fn with_account(account: Account) -> Self {
        let provider = Self::default();
        provider.accounts.borrow_mut().push(account);
        provider
    }

    /// Replace the provider's account state and notify listeners.
    pub fn emit(&self, account: Option<Account>) {
        *self.accounts.borrow_mut() = account.iter().cloned().collect();

        // Snapshot listeners so a callback may (un)subscribe without a borrow conflict.
        let listeners: Vec<Rc<dyn Fn(Option<Account>)>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(account.clone());
        }
    }

    /// Account that the next interactive sign-in resolves to (`None` = user cancels).
    pub fn set_interactive_account(&self, account: Option<Account>) {
        *self.interactive_account.borrow_mut() = account;
    }

    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.set(fail);
    }

    pub fn sign_in_requests(&self) -> usize {
        self.sign_in_requests.get()
    }

    pub fn sign_out_requests(&self) -> usize {
        self.sign_out_requests.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl core::fmt::Debug for InMemoryIdentityProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryIdentityProvider")
            .field("accounts", &self.accounts.borrow())
            .field("listeners", &self.listener_count())
            .field("sign_in_requests", &self.sign_in_requests.get())
            .field("sign_out_requests", &self.sign_out_requests.get())
            .finish()
    }
}

#[async_trait(?Send)]
impl IdentityProvider for InMemoryIdentityProvider {
    fn is_authenticated(&self) -> bool {
        !self.accounts.borrow().is_empty()
    }

    fn current_accounts(&self) -> Vec<Account> {
        self.accounts.borrow().clone()
    }

    async fn sign_in_interactive(&self) -> Result<(), ProviderError> {
        self.sign_in_requests.set(self.sign_in_requests.get() + 1);
        let account = self.interactive_account.borrow_mut().take();
        match account {
            Some(account) => {
                self.emit(Some(account));
                Ok(())
            }
            None => Err(ProviderError::SignInFailed("user cancelled".to_string())),
        }
    }

    async fn sign_out_interactive(&self) -> Result<(), ProviderError> {
        self.sign_out_requests.set(self.sign_out_requests.get() + 1);
        if self.fail_sign_out.get() {
            return Err(ProviderError::SignOutFailed("popup blocked".to_string()));
        }
        self.emit(None);
        Ok(())
    }

    fn subscribe(&self, listener: StatusListener) -> ListenerId {
        let id = ListenerId::new(self.next_listener.get());
        self.next_listener.set(id.as_u64() + 1);
        self.listeners.borrow_mut().push((id, Rc::from(listener)));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(existing, _)| *existing != id);
    }
}
