//! Leptos frontend for the HR portal.

pub mod app;
pub mod auth;
pub mod nav;
pub mod provider;
pub mod storage;

use wasm_bindgen::prelude::*;

/// WASM entry point, called when the module loads.
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(app::App);
}
