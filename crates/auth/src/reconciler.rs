//! Identity reconciliation (local login vs. federated provider).
//!
//! The reconciler is the only writer of the session. Every operation takes
//! `&mut self` and runs its read-decide-write to completion, so two events
//! can never interleave inside one step.
//!
//! Precedence rules:
//! - A local login is an anchor: federated signals are ignored until logout.
//! - With no session, a reported provider account becomes a federated session
//!   with the baseline role.
//! - A federated session ends when the provider reports no account.
//! - After logout, the account whose sign-out was requested cannot recreate a
//!   session until the provider reports no account or the user starts an
//!   interactive federated sign-in.

use std::rc::Rc;

use thiserror::Error;

use hrportal_core::AccountId;

use crate::authority::RoleAuthority;
use crate::directory::LocalDirectory;
use crate::provider::{Account, FederatedStatus, IdentityProvider, ProviderError};
use crate::session::{AuthSnapshot, Session, SessionOrigin};
use crate::store::SessionStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Unknown username or rejected credential.
    #[error("invalid username or credential")]
    InvalidCredentials,
}

/// How a federated status report was reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FederatedDecision {
    /// New federated session materialized.
    Created(Session),
    /// Federated session switched to a different provider account.
    Replaced(Session),
    /// Federated session cleared (provider signed out externally).
    Cleared(Session),
    /// A local session is active; the report did not touch it.
    IgnoredLocalPrecedence,
    /// The account was signed out by logout and has not been re-confirmed.
    Suppressed,
    /// Nothing to do (same account again, or no account and no session).
    Unchanged,
}

/// Result of `logout`.
///
/// Local state is already cleared when this is returned.
#[derive(Debug)]
pub struct LogoutOutcome {
    pub cleared: Option<Session>,
    /// Provider sign-out to run, if one is needed; spawn it, do not block on it.
    pub sign_out: Option<SignOutTask>,
}

/// Deferred, best-effort provider sign-out.
pub struct SignOutTask {
    provider: Rc<dyn IdentityProvider>,
}

impl SignOutTask {
    fn new(provider: Rc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Request provider sign-out.
    ///
    /// Failure is logged and returned for inspection; it never restores the
    /// cleared session.
    pub async fn run(self) -> Result<(), ProviderError> {
        let result = self.provider.sign_out_interactive().await;
        match &result {
            Ok(()) => tracing::info!("federated provider sign-out completed"),
            Err(err) => tracing::warn!(kind = "ProviderSignOutFailed", "federated provider sign-out failed: {err}"),
        }
        result
    }
}

impl core::fmt::Debug for SignOutTask {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignOutTask").finish_non_exhaustive()
    }
}

pub struct IdentityReconciler {
    store: Box<dyn SessionStore>,
    directory: Box<dyn LocalDirectory>,
    provider: Rc<dyn IdentityProvider>,
    session: Option<Session>,
    federated: FederatedStatus,
    suppressed: Option<AccountId>,
}

impl IdentityReconciler {
    pub fn new(
        store: Box<dyn SessionStore>,
        directory: Box<dyn LocalDirectory>,
        provider: Rc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            directory,
            provider,
            session: None,
            federated: FederatedStatus::Unresolved,
            suppressed: None,
        }
    }

    /// Load the persisted session (local origin only) into memory.
    pub fn restore(&mut self) -> Option<&Session> {
        match self.store.load() {
            Ok(Some(session)) => {
                tracing::info!("restored local session for user {}", session.user_id);
                self.session = Some(session);
            }
            Ok(None) => {}
            Err(err) => tracing::error!("failed to load persisted session: {err}"),
        }
        self.session.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn federated_status(&self) -> &FederatedStatus {
        &self.federated
    }

    pub fn authority(&self) -> RoleAuthority<'_> {
        RoleAuthority::new(self.session.as_ref())
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            session: self.session.clone(),
            federated: self.federated.clone(),
        }
    }

    /// Explicit credential login against the local directory.
    ///
    /// On failure the session is left untouched.
    pub fn login_local(&mut self, username: &str, credential: &str) -> Result<Session, LoginError> {
        let Some(entry) = self.directory.find_by_username(username) else {
            tracing::info!("local login rejected: unknown username");
            return Err(LoginError::InvalidCredentials);
        };
        if !self.directory.verify_credential(&entry, credential) {
            tracing::info!("local login rejected for user {}: credential mismatch", entry.user_id);
            return Err(LoginError::InvalidCredentials);
        }

        let session = Session::local(&entry);
        self.persist(&session);
        if let Some(previous) = self.session.replace(session.clone()) {
            tracing::debug!("local login replaced {} session for user {}", previous.origin, previous.user_id);
        }
        tracing::info!("local login succeeded for user {} with roles {}", session.user_id, session.roles);
        Ok(session)
    }

    /// Reconcile a provider status report (`None` = no signed-in account).
    pub fn on_federated_status_changed(&mut self, account: Option<Account>) -> FederatedDecision {
        self.federated = FederatedStatus::from(account.clone());
        if account.is_none() {
            self.suppressed = None;
        }

        let current = self.session.as_ref().map(|session| session.origin);
        match (current, account) {
            (Some(SessionOrigin::Local), _) => {
                tracing::debug!("ignoring federated status change: local session has precedence");
                FederatedDecision::IgnoredLocalPrecedence
            }
            (None, Some(account)) => {
                if self.suppressed.as_ref() == Some(&account.id) {
                    tracing::debug!("ignoring provider account {}: signed out by logout", account.id);
                    return FederatedDecision::Suppressed;
                }
                let session = Session::federated(&account);
                self.persist(&session);
                self.session = Some(session.clone());
                tracing::info!("federated session established for account {}", account.id);
                FederatedDecision::Created(session)
            }
            (None, None) => FederatedDecision::Unchanged,
            (Some(SessionOrigin::Federated), None) => {
                self.clear_store();
                let cleared = self.session.take();
                tracing::info!("federated session ended: provider reports no account");
                cleared.map_or(FederatedDecision::Unchanged, FederatedDecision::Cleared)
            }
            (Some(SessionOrigin::Federated), Some(account)) => {
                if self.session.as_ref().is_some_and(|session| session.belongs_to(&account)) {
                    return FederatedDecision::Unchanged;
                }
                let session = Session::federated(&account);
                self.persist(&session);
                self.session = Some(session.clone());
                tracing::info!("federated session switched to account {}", account.id);
                FederatedDecision::Replaced(session)
            }
        }
    }

    /// Mark the provider status as outstanding ahead of an interactive sign-in.
    pub fn begin_federated_sign_in(&mut self) {
        self.federated = FederatedStatus::Unresolved;
        self.suppressed = None;
    }

    /// Clear the session unconditionally and decide whether the provider
    /// must be signed out as well.
    pub fn logout(&mut self) -> LogoutOutcome {
        let cleared = self.session.take();
        self.clear_store();

        let federated_account = self
            .federated
            .account()
            .map(|account| account.id.clone())
            .or_else(|| self.provider.current_accounts().into_iter().next().map(|account| account.id));
        let was_federated = cleared
            .as_ref()
            .is_some_and(|session| session.origin == SessionOrigin::Federated);
        let provider_active = self.provider.is_authenticated() || federated_account.is_some();

        let sign_out = if was_federated || provider_active {
            self.suppressed = federated_account.or_else(|| {
                cleared
                    .as_ref()
                    .filter(|session| session.origin == SessionOrigin::Federated)
                    .map(|session| AccountId::new(session.user_id.as_str()))
            });
            Some(SignOutTask::new(Rc::clone(&self.provider)))
        } else {
            None
        };

        match &cleared {
            Some(session) => tracing::info!("logged out {} session for user {}", session.origin, session.user_id),
            None => tracing::debug!("logout with no active session"),
        }

        LogoutOutcome { cleared, sign_out }
    }

    fn persist(&self, session: &Session) {
        if let Err(err) = self.store.save(session) {
            tracing::error!("failed to persist session for user {}: {err}", session.user_id);
        }
    }

    fn clear_store(&self) {
        if let Err(err) = self.store.clear() {
            tracing::error!("failed to clear persisted session: {err}");
        }
    }
}

impl core::fmt::Debug for IdentityReconciler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityReconciler")
            .field("session", &self.session)
            .field("federated", &self.federated)
            .field("suppressed", &self.suppressed)
            .finish_non_exhaustive()
    }
}
