//! `sessionStorage` backend (WASM only)

use wasm_bindgen::JsValue;

use super::SessionStore;
use crate::error::StoreError;

/// Thin wrapper over the window's `sessionStorage`
pub struct WebSessionStore {
    storage: web_sys::Storage,
}

impl WebSessionStore {
    /// Open the current window's session storage
    pub fn open() -> Result<Self, StoreError> {
        let storage = web_sys::window()
            .and_then(|w| w.session_storage().ok())
            .flatten()
            .ok_or(StoreError::Unavailable)?;
        Ok(Self { storage })
    }
}

fn backend_err(e: JsValue) -> StoreError {
    // Quota failures surface as a DOMException named QuotaExceededError
    let name = js_sys::Reflect::get(&e, &JsValue::from_str("name"))
        .ok()
        .and_then(|n| n.as_string())
        .unwrap_or_default();
    if name == "QuotaExceededError" {
        return StoreError::QuotaExceeded {
            key: String::new(),
            needed: 0,
            available: 0,
        };
    }
    StoreError::Backend(format!("{:?}", e))
}

impl SessionStore for WebSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(backend_err)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(|e| match backend_err(e) {
            StoreError::QuotaExceeded { .. } => StoreError::QuotaExceeded {
                key: key.to_string(),
                needed: key.len() + value.len(),
                available: 0,
            },
            other => other,
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(backend_err)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let len = self.storage.length().map_err(backend_err)?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Some(key) = self.storage.key(i).map_err(backend_err)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
