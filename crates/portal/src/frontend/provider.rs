//! Binding to the page's federated identity client.
//!
//! The host page exposes the provider's browser SDK as `window.hrIdentity`:
//!
//! - `isAuthenticated(): boolean`
//! - `getAllAccounts(): { id, username, name? }[]`
//! - `loginPopup(): Promise`
//! - `logoutPopup(): Promise`
//! - `addStatusListener(fn)` / `removeStatusListener(fn)`; `fn` receives the
//!   current account or `null`, including once for the initial status
//!   after the client has finished its own startup check

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use hrportal_auth::{Account, IdentityProvider, ListenerId, ProviderError, StatusListener};

const GLOBAL_NAME: &str = "hrIdentity";

pub struct JsIdentityProvider {
    client: JsValue,
    listeners: RefCell<HashMap<ListenerId, Closure<dyn Fn(JsValue)>>>,
    next_listener: Cell<u64>,
}

impl JsIdentityProvider {
    /// Bind to `window.hrIdentity`.
    pub fn from_window() -> Result<Self, ProviderError> {
        let window = web_sys::window().ok_or_else(|| ProviderError::Unavailable("no window object".to_string()))?;
        let client = Reflect::get(&window, &JsValue::from_str(GLOBAL_NAME))
            .map_err(|e| ProviderError::Unavailable(format!("failed to get {GLOBAL_NAME}: {e:?}")))?;
        if client.is_undefined() || client.is_null() {
            return Err(ProviderError::Unavailable(format!("window.{GLOBAL_NAME} is not defined")));
        }
        Ok(Self {
            client,
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(0),
        })
    }

    fn call(&self, method: &str, args: &[&JsValue]) -> Result<JsValue, String> {
        let function = Reflect::get(&self.client, &JsValue::from_str(method))
            .map_err(|e| format!("failed to get {method}: {e:?}"))?;
        if !function.is_function() {
            return Err(format!("{method} is not a function"));
        }
        let function = Function::from(function);
        let result = match args {
            [] => function.call0(&self.client),
            [a] => function.call1(&self.client, a),
            [a, b, ..] => function.call2(&self.client, a, b),
        };
        result.map_err(|e| format!("{method} threw: {e:?}"))
    }

    async fn call_async(&self, method: &str) -> Result<JsValue, String> {
        let promise = self.call(method, &[])?;
        JsFuture::from(Promise::resolve(&promise))
            .await
            .map_err(|e| format!("{method} rejected: {e:?}"))
    }
}

fn parse_account(value: JsValue) -> Option<Account> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    match serde_wasm_bindgen::from_value(value) {
        Ok(account) => Some(account),
        Err(err) => {
            tracing::warn!("ignoring malformed provider account: {err}");
            None
        }
    }
}

#[async_trait(?Send)]
impl IdentityProvider for JsIdentityProvider {
    fn is_authenticated(&self) -> bool {
        match self.call("isAuthenticated", &[]) {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(err) => {
                tracing::warn!("provider status query failed: {err}");
                false
            }
        }
    }

    fn current_accounts(&self) -> Vec<Account> {
        let value = match self.call("getAllAccounts", &[]) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("provider account query failed: {err}");
                return Vec::new();
            }
        };
        serde_wasm_bindgen::from_value(value).unwrap_or_else(|err| {
            tracing::warn!("ignoring malformed provider account list: {err}");
            Vec::new()
        })
    }

    async fn sign_in_interactive(&self) -> Result<(), ProviderError> {
        self.call_async("loginPopup").await.map(|_| ()).map_err(ProviderError::SignInFailed)
    }

    async fn sign_out_interactive(&self) -> Result<(), ProviderError> {
        self.call_async("logoutPopup").await.map(|_| ()).map_err(ProviderError::SignOutFailed)
    }

    fn subscribe(&self, listener: StatusListener) -> ListenerId {
        let id = ListenerId::new(self.next_listener.get());
        self.next_listener.set(id.as_u64() + 1);

        let closure = Closure::<dyn Fn(JsValue)>::new(move |value: JsValue| listener(parse_account(value)));
        if let Err(err) = self.call("addStatusListener", &[closure.as_ref()]) {
            tracing::warn!("failed to subscribe to provider status: {err}");
        }
        self.listeners.borrow_mut().insert(id, closure);
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        let Some(closure) = self.listeners.borrow_mut().remove(&id) else {
            return;
        };
        if let Err(err) = self.call("removeStatusListener", &[closure.as_ref()]) {
            tracing::warn!("failed to unsubscribe from provider status: {err}");
        }
    }
}
