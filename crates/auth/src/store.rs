//! Durable session persistence.
//!
//! Layout: two co-written fields under fixed keys, the serialized session
//! payload and its origin tag. Both are present or both are absent; anything
//! else is treated as a torn write and discarded on load.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use crate::session::{Session, SessionOrigin};

/// Storage key of the serialized session payload.
pub const SESSION_KEY: &str = "hrportal.session";

/// Storage key of the origin tag written alongside the payload.
pub const ORIGIN_KEY: &str = "hrportal.session.origin";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session storage backend failed: {0}")]
    Backend(String),

    #[error("failed to serialize session: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Persistence contract for the current session.
///
/// - `save` is atomic per write (no torn payload/origin pair is observable)
/// - `load` only yields sessions produced by a local login
/// - `clear` is idempotent
pub trait SessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError>;

    fn save(&self, session: &Session) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

/// Minimal key-value backend the session layout is written to.
///
/// Implementations should write both entries in one atomic operation where
/// the medium allows it.
pub trait KeyValueBackend {
    fn read(&self, keys: [&str; 2]) -> Result<[Option<String>; 2], StoreError>;

    fn write(&self, entries: [(&str, String); 2]) -> Result<(), StoreError>;

    fn remove(&self, keys: [&str; 2]) -> Result<(), StoreError>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for Rc<B> {
    fn read(&self, keys: [&str; 2]) -> Result<[Option<String>; 2], StoreError> {
        (**self).read(keys)
    }

    fn write(&self, entries: [(&str, String); 2]) -> Result<(), StoreError> {
        (**self).write(entries)
    }

    fn remove(&self, keys: [&str; 2]) -> Result<(), StoreError> {
        (**self).remove(keys)
    }
}

/// `SessionStore` implementing the two-key layout over any backend.
#[derive(Debug)]
pub struct KeyValueSessionStore<B> {
    backend: B,
}

impl<B: KeyValueBackend> KeyValueSessionStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn discard(&self, reason: &str) -> Result<Option<Session>, StoreError> {
        tracing::warn!("discarding persisted session: {}", reason);
        self.backend.remove([SESSION_KEY, ORIGIN_KEY])?;
        Ok(None)
    }
}

impl<B: KeyValueBackend> SessionStore for KeyValueSessionStore<B> {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        let [payload, tag] = self.backend.read([SESSION_KEY, ORIGIN_KEY])?;

        let (payload, tag) = match (payload, tag) {
            (None, None) => return Ok(None),
            (Some(payload), Some(tag)) => (payload, tag),
            _ => return self.discard("payload and origin tag were not written together"),
        };

        let origin: SessionOrigin = match tag.parse() {
            Ok(origin) => origin,
            Err(_) => return self.discard("unrecognised origin tag"),
        };

        // A federated session must be re-confirmed by the provider on startup.
        if origin == SessionOrigin::Federated {
            return self.discard("federated session requires fresh provider confirmation");
        }

        let session: Session = match serde_json::from_str(&payload) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!("persisted session payload is unreadable: {err}");
                return self.discard("unreadable payload");
            }
        };

        if session.origin != origin {
            return self.discard("origin tag disagrees with payload");
        }

        Ok(Some(session))
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        let payload = serde_json::to_string(session)?;
        self.backend.write([
            (SESSION_KEY, payload),
            (ORIGIN_KEY, session.origin.as_str().to_string()),
        ])
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove([SESSION_KEY, ORIGIN_KEY])
    }
}

/// In-memory key-value backend for tests/dev.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single raw entry, bypassing the paired-write contract.
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }

    /// Number of successful `write` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueBackend for MemoryBackend {
    fn read(&self, keys: [&str; 2]) -> Result<[Option<String>; 2], StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::backend("memory backend lock poisoned"))?;
        Ok(keys.map(|key| entries.get(key).cloned()))
    }

    fn write(&self, entries: [(&str, String); 2]) -> Result<(), StoreError> {
        let mut map = self
            .entries
            .lock()
            .map_err(|_| StoreError::backend("memory backend lock poisoned"))?;
        for (key, value) in entries {
            map.insert(key.to_string(), value);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, keys: [&str; 2]) -> Result<(), StoreError> {
        let mut map = self
            .entries
            .lock()
            .map_err(|_| StoreError::backend("memory backend lock poisoned"))?;
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryEntry;
    use crate::provider::Account;
    use crate::roles::Role;

    fn store() -> KeyValueSessionStore<Rc<MemoryBackend>> {
        KeyValueSessionStore::new(Rc::new(MemoryBackend::new()))
    }

    fn local_session() -> Session {
        Session::local(&DirectoryEntry::new(
            "u-1",
            "admin",
            "Admin",
            "admin@example.com",
            vec![Role::HrAdmin, Role::SystemAdmin],
        ))
    }

    #[test]
    fn save_then_load_reproduces_local_session() {
        let store = store();
        let session = local_session();
        store.save(&session).unwrap();

        assert_eq!(store.backend().get_raw(ORIGIN_KEY).as_deref(), Some("local"));
        assert_eq!(store.load().unwrap(), Some(session));
    }

    #[test]
    fn federated_session_is_not_reused_on_load() {
        let store = store();
        store
            .save(&Session::federated(&Account::new("abc", "u@x.com")))
            .unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(store.backend().is_empty());
    }

    #[test]
    fn torn_pair_is_treated_as_absent_and_removed() {
        let store = store();
        store.backend().insert_raw(ORIGIN_KEY, "local");

        assert_eq!(store.load().unwrap(), None);
        assert!(store.backend().is_empty());
    }

    #[test]
    fn mismatched_origin_tag_is_discarded() {
        let store = store();
        let payload = serde_json::to_string(&local_session()).unwrap();
        store.backend().insert_raw(SESSION_KEY, &payload);
        store.backend().insert_raw(ORIGIN_KEY, "federated");

        // Federated tag short-circuits before the payload is read.
        assert_eq!(store.load().unwrap(), None);

        store.backend().insert_raw(SESSION_KEY, &payload.replace("\"local\"", "\"federated\""));
        store.backend().insert_raw(ORIGIN_KEY, "local");
        assert_eq!(store.load().unwrap(), None);
        assert!(store.backend().is_empty());
    }

    #[test]
    fn unreadable_payload_is_discarded() {
        let store = store();
        store.backend().insert_raw(SESSION_KEY, "{not json");
        store.backend().insert_raw(ORIGIN_KEY, "local");

        assert_eq!(store.load().unwrap(), None);
        assert!(store.backend().is_empty());
    }

    #[test]
    fn clear_is_idempotent() {
        let store = store();
        store.save(&local_session()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
