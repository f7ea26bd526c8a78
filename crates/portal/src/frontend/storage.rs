//! `window.localStorage` session backend.

use wasm_bindgen::JsValue;
use web_sys::Storage;

use hrportal_auth::{KeyValueBackend, StoreError};

fn js_error(context: &str, err: JsValue) -> StoreError {
    StoreError::backend(format!("{context}: {err:?}"))
}

#[derive(Debug, Clone)]
pub struct LocalStorageBackend {
    storage: Storage,
}

impl LocalStorageBackend {
    /// The window's local storage, if the browser exposes one.
    pub fn from_window() -> Result<Self, StoreError> {
        let window = web_sys::window().ok_or_else(|| StoreError::backend("no window object"))?;
        let storage = window
            .local_storage()
            .map_err(|e| js_error("localStorage access denied", e))?
            .ok_or_else(|| StoreError::backend("localStorage unavailable"))?;
        Ok(Self { storage })
    }
}

impl KeyValueBackend for LocalStorageBackend {
    fn read(&self, keys: [&str; 2]) -> Result<[Option<String>; 2], StoreError> {
        let first = self
            .storage
            .get_item(keys[0])
            .map_err(|e| js_error("failed to read session entry", e))?;
        let second = self
            .storage
            .get_item(keys[1])
            .map_err(|e| js_error("failed to read session entry", e))?;
        Ok([first, second])
    }

    /// localStorage has no transactions: if the second write fails the first
    /// entry is removed again so no half-written pair survives.
    fn write(&self, entries: [(&str, String); 2]) -> Result<(), StoreError> {
        let [(first_key, first_value), (second_key, second_value)] = entries;
        self.storage
            .set_item(first_key, &first_value)
            .map_err(|e| js_error("failed to write session entry", e))?;
        if let Err(err) = self.storage.set_item(second_key, &second_value) {
            if let Err(rollback) = self.storage.remove_item(first_key) {
                tracing::warn!("failed to roll back partial session write for {first_key}: {rollback:?}");
            }
            return Err(js_error("failed to write session entry", err));
        }
        Ok(())
    }

    fn remove(&self, keys: [&str; 2]) -> Result<(), StoreError> {
        for key in keys {
            self.storage
                .remove_item(key)
                .map_err(|e| js_error("failed to remove session entry", e))?;
        }
        Ok(())
    }
}
