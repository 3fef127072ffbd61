//! Veil WASM - Browser Bindings
//!
//! Exposes unlock resolution to page scripts, backed by `sessionStorage`:
//!
//! - `isUnlocked(scopeId?, isolated, override?)` for first paint and every
//!   re-check
//! - `unlock(scopeId?, isolated, alsoGlobal)` after a successful
//!   `verify(submitted, expected)`
//! - `signalName(scopeId?)` and `readsKey(scopeId?, isolated, key)` for
//!   wiring `veil:unlocked*` and `storage` listeners
//!
//! Reads never throw: with no window or no storage every flag is absent.

use js_sys::{Object, Reflect};
use veil_core::{
    resolve, signal, Error, Result, Scope, ScopeId, StorageKey, UnlockStore, WriteMode,
};
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit, Storage};

/// Value stored under a set flag.
pub const FLAG_VALUE: &str = "true";

/// [`UnlockStore`] over the window's `sessionStorage`.
pub struct SessionStorageStore {
    storage: Option<Storage>,
}

impl SessionStorageStore {
    /// Bind to the current window. Missing window or storage (or a browser
    /// refusing access) yields a store that reads every flag as absent.
    pub fn from_window() -> Self {
        let storage = web_sys::window().and_then(|window| window.session_storage().ok().flatten());
        Self { storage }
    }
}

impl UnlockStore for SessionStorageStore {
    fn get(&self, key: &StorageKey) -> bool {
        self.storage
            .as_ref()
            .and_then(|storage| storage.get_item(key.as_str()).ok().flatten())
            .map(|value| value == FLAG_VALUE)
            .unwrap_or(false)
    }

    fn set(&self, key: &StorageKey) -> Result<()> {
        let storage = self.storage.as_ref().ok_or(Error::StorageUnavailable)?;
        storage
            .set_item(key.as_str(), FLAG_VALUE)
            .map_err(|_| Error::StorageUnavailable)
    }

    fn is_available(&self) -> bool {
        self.storage.is_some()
    }
}

/// Scope from JS arguments. A missing or empty id means the global scope.
pub fn scope_from_parts(scope_id: Option<String>, isolated: bool) -> Scope {
    match scope_id.filter(|id| !id.is_empty()) {
        Some(id) if isolated => Scope::isolated(id),
        Some(id) => Scope::named(id),
        None => Scope::global(),
    }
}

/// Whether gated content of the given scope should render unlocked.
#[wasm_bindgen(js_name = isUnlocked)]
pub fn is_unlocked(scope_id: Option<String>, isolated: bool, override_state: Option<bool>) -> bool {
    let scope = scope_from_parts(scope_id, isolated);
    if let Some(forced) = override_state {
        return forced;
    }
    resolve(&scope, None, &SessionStorageStore::from_window())
}

/// Case- and whitespace-insensitive credential comparison.
#[wasm_bindgen]
pub fn verify(submitted: &str, expected: &str) -> bool {
    veil_core::verify(submitted, expected)
}

/// Persist an unlock and announce it. Returns whether anything was written.
///
/// `also_global` selects between writing only the scope's own flag and
/// writing the global flag too; it is ignored for the global scope.
#[wasm_bindgen]
pub fn unlock(scope_id: Option<String>, isolated: bool, also_global: bool) -> bool {
    let scope = scope_from_parts(scope_id, isolated);
    let mode = if also_global {
        WriteMode::NamedAndGlobal
    } else {
        WriteMode::NamedOnly
    };

    let store = SessionStorageStore::from_window();
    let mut written = false;
    for key in scope.write_keys(mode) {
        match store.set(&key) {
            Ok(()) => written = true,
            Err(e) => {
                tracing::warn!(%key, "{}", e);
                break;
            }
        }
    }
    if written {
        notify(&scope);
    }
    written
}

/// Name of the unlock event to listen for: scope-qualified when an id is
/// given, generic otherwise.
#[wasm_bindgen(js_name = signalName)]
pub fn signal_name(scope_id: Option<String>) -> String {
    match scope_id.filter(|id| !id.is_empty()) {
        Some(id) => signal::scoped(&ScopeId::new(id)),
        None => signal::UNLOCKED.to_string(),
    }
}

/// Whether a `storage` event for `key` can affect the given scope.
#[wasm_bindgen(js_name = readsKey)]
pub fn reads_key(scope_id: Option<String>, isolated: bool, key: &str) -> bool {
    scope_from_parts(scope_id, isolated)
        .read_keys()
        .iter()
        .any(|k| k.as_str() == key)
}

/// Dispatch the in-page unlock events. Other tabs already received a native
/// `storage` event from the write itself.
fn notify(scope: &Scope) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let detail = Object::new();
    if let Some(id) = scope.id() {
        let _ = Reflect::set(
            &detail,
            &JsValue::from_str("scope"),
            &JsValue::from_str(id.as_str()),
        );
    }

    for name in signal::names_for(scope) {
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(&name, &init) {
            Ok(event) => {
                let _ = window.dispatch_event(&event);
            }
            Err(_) => tracing::warn!(event = %name, "failed to create unlock event"),
        }
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn unlock_round_trip() {
        assert!(!is_unlocked(Some("wasm-iso".into()), true, None));
        assert!(unlock(Some("wasm-iso".into()), true, false));
        assert!(is_unlocked(Some("wasm-iso".into()), true, None));
        assert!(!is_unlocked(Some("wasm-other".into()), true, None));
    }
}
