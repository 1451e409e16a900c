//! Browser `localStorage` backend for the cart.

use rental_core::{CartStorage, RentalError, RentalResult};
use wasm_bindgen::JsValue;

fn storage_error(action: &str, err: JsValue) -> RentalError {
    let detail = err.as_string().unwrap_or_else(|| format!("{:?}", err));
    RentalError::Internal(format!("localStorage {} failed: {}", action, detail))
}

/// [`CartStorage`] over `window.localStorage`
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// The current window's `localStorage`. Fails outside a browser window or
    /// when storage is disabled.
    pub fn from_window() -> RentalResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| RentalError::Internal("no global window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| storage_error("access", e))?
            .ok_or_else(|| RentalError::Internal("localStorage is unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

impl CartStorage for LocalStorage {
    fn load(&self, key: &str) -> RentalResult<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| storage_error("read", e))
    }

    fn save(&mut self, key: &str, value: &str) -> RentalResult<()> {
        // Throws QuotaExceededError when full
        self.storage
            .set_item(key, value)
            .map_err(|e| storage_error("write", e))
    }

    fn remove(&mut self, key: &str) -> RentalResult<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| storage_error("remove", e))
    }
}
