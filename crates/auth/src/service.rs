//! Shared identity service handle.
//!
//! Explicitly constructed (`init`) and torn down (`shutdown`), then passed by
//! reference to whatever needs the session: route guards, the navigation
//! menu, the login page. All mutations funnel through the one reconciler;
//! a provider report that arrives while a step is running is queued and
//! processed right after that step finishes.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::directory::LocalDirectory;
use crate::guard::GuardState;
use crate::provider::{Account, IdentityProvider, ListenerId, ProviderError};
use crate::reconciler::{IdentityReconciler, LoginError, LogoutOutcome};
use crate::roles::Role;
use crate::session::{AuthSnapshot, Session};
use crate::store::SessionStore;

/// Handle returned by `IdentityService::watch`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

type Watcher = Rc<dyn Fn(&AuthSnapshot)>;

struct ServiceInner {
    reconciler: RefCell<IdentityReconciler>,
    provider: Rc<dyn IdentityProvider>,
    pending: RefCell<VecDeque<Option<Account>>>,
    watchers: RefCell<Vec<(WatchId, Watcher)>>,
    next_watch: Cell<u64>,
    subscription: Cell<Option<ListenerId>>,
}

impl Drop for ServiceInner {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.provider.unsubscribe(id);
        }
    }
}

#[derive(Clone)]
pub struct IdentityService {
    inner: Rc<ServiceInner>,
}

impl IdentityService {
    /// Restore the persisted session and subscribe to provider status.
    ///
    /// If the provider already reports an account, that status is reconciled
    /// immediately; otherwise the federated status stays unresolved until the
    /// provider reports.
    pub fn init<S, D>(store: S, directory: D, provider: Rc<dyn IdentityProvider>) -> Self
    where
        S: SessionStore + 'static,
        D: LocalDirectory + 'static,
    {
        let mut reconciler = IdentityReconciler::new(Box::new(store), Box::new(directory), Rc::clone(&provider));
        reconciler.restore();

        let service = Self {
            inner: Rc::new(ServiceInner {
                reconciler: RefCell::new(reconciler),
                provider: Rc::clone(&provider),
                pending: RefCell::new(VecDeque::new()),
                watchers: RefCell::new(Vec::new()),
                next_watch: Cell::new(0),
                subscription: Cell::new(None),
            }),
        };

        let weak: Weak<ServiceInner> = Rc::downgrade(&service.inner);
        let id = provider.subscribe(Box::new(move |account| {
            if let Some(inner) = weak.upgrade() {
                IdentityService { inner }.on_federated_status_changed(account);
            }
        }));
        service.inner.subscription.set(Some(id));

        if provider.is_authenticated() {
            service.on_federated_status_changed(provider.current_accounts().into_iter().next());
        }

        tracing::info!("identity service initialised");
        service
    }

    /// Unsubscribe from the provider and drop all watchers.
    pub fn shutdown(&self) {
        if let Some(id) = self.inner.subscription.take() {
            self.inner.provider.unsubscribe(id);
        }
        self.inner.watchers.borrow_mut().clear();
        tracing::info!("identity service shut down");
    }

    pub fn login_local(&self, username: &str, credential: &str) -> Result<Session, LoginError> {
        self.step(|reconciler| reconciler.login_local(username, credential))
    }

    /// Queue a provider status report and process it as soon as no other
    /// step is running.
    pub fn on_federated_status_changed(&self, account: Option<Account>) {
        self.inner.pending.borrow_mut().push_back(account);
        self.drain();
    }

    /// Clear the session; the returned sign-out task (if any) should be
    /// spawned by the caller.
    pub fn logout(&self) -> LogoutOutcome {
        self.step(|reconciler| reconciler.logout())
    }

    /// Interactive federated sign-in.
    ///
    /// Whatever the outcome, the status is settled from the provider's
    /// account list afterwards so the guard never stays unresolved.
    pub async fn sign_in_federated(&self) -> Result<(), ProviderError> {
        self.step(|reconciler| reconciler.begin_federated_sign_in());

        let provider = Rc::clone(&self.inner.provider);
        let result = provider.sign_in_interactive().await;
        if let Err(err) = &result {
            tracing::warn!("federated sign-in failed: {err}");
        }
        self.on_federated_status_changed(provider.current_accounts().into_iter().next());
        result
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.reconciler.borrow().snapshot()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.reconciler.borrow().session().cloned()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.inner.reconciler.borrow().authority().has_role(role)
    }

    pub fn guard_state(&self) -> GuardState {
        GuardState::evaluate(&self.snapshot())
    }

    /// Register a callback run with the new snapshot after every change.
    pub fn watch(&self, watcher: impl Fn(&AuthSnapshot) + 'static) -> WatchId {
        let id = WatchId(self.inner.next_watch.get());
        self.inner.next_watch.set(id.0 + 1);
        self.inner.watchers.borrow_mut().push((id, Rc::new(watcher)));
        id
    }

    pub fn unwatch(&self, id: WatchId) {
        self.inner.watchers.borrow_mut().retain(|(existing, _)| *existing != id);
    }

    fn step<T>(&self, f: impl FnOnce(&mut IdentityReconciler) -> T) -> T {
        let (result, before, after) = {
            let mut reconciler = self.inner.reconciler.borrow_mut();
            let before = reconciler.snapshot();
            let result = f(&mut *reconciler);
            let after = reconciler.snapshot();
            (result, before, after)
        };
        if before != after {
            self.notify(&after);
        }
        self.drain();
        result
    }

    fn drain(&self) {
        loop {
            // A running step drains the queue itself once it finishes.
            if self.inner.reconciler.try_borrow_mut().is_err() {
                return;
            }
            let Some(account) = self.inner.pending.borrow_mut().pop_front() else {
                return;
            };
            let (before, after) = {
                let mut reconciler = self.inner.reconciler.borrow_mut();
                let before = reconciler.snapshot();
                let decision = reconciler.on_federated_status_changed(account);
                tracing::debug!("federated status reconciled: {decision:?}");
                (before, reconciler.snapshot())
            };
            if before != after {
                self.notify(&after);
            }
        }
    }

    fn notify(&self, snapshot: &AuthSnapshot) {
        let watchers: Vec<Watcher> = self
            .inner
            .watchers
            .borrow()
            .iter()
            .map(|(_, watcher)| Rc::clone(watcher))
            .collect();
        for watcher in watchers {
            watcher(snapshot);
        }
    }
}

impl core::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityService")
            .field("snapshot", &self.snapshot())
            .field("watchers", &self.inner.watchers.borrow().len())
            .finish_non_exhaustive()
    }
}
