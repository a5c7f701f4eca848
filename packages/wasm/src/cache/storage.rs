//! Key/value storage backends.
//!
//! The graph cache only needs string get/set/remove. In the browser that is
//! `localStorage`; natively (tests, or when storage is unavailable) an
//! in-memory map stands in.

use std::collections::HashMap;

use crate::error::{MindMapError, Result};

/// Minimal string key/value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// `window.localStorage`.
pub struct BrowserStorage {
    storage: web_sys::Storage,
}

impl BrowserStorage {
    pub fn new(storage: web_sys::Storage) -> Self {
        Self { storage }
    }

    /// The page's local storage, if the environment exposes one.
    pub fn local() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self::new(storage))
    }
}

fn storage_error(err: wasm_bindgen::JsValue) -> MindMapError {
    MindMapError::Storage(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(storage_error)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(storage_error)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(storage_error)
    }
}
