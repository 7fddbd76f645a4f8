use std::cell::RefCell;
use std::collections::HashMap;

use serde::{de::DeserializeOwned, Serialize};

/// Almacenamiento clave/valor de la pestaña (sessionStorage, localStorage o memoria)
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), String>;
    fn remove_item(&self, key: &str) -> Result<(), String>;
}

pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), String> {
    let json = serde_json::to_string(value)
        .map_err(|e| format!("Error serializando datos: {}", e))?;
    store.set_item(key, &json)
}

/// Valor ausente o corrupto -> None
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let json = store.get_item(key)?;
    serde_json::from_str(&json).ok()
}

/// Fallback cuando el navegador no expone storage (modo privado, tests)
#[derive(Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserStorage, StorageArea};

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::KeyValueStore;
    use web_sys::{window, Storage};

    #[derive(Clone, Copy, Debug, PartialEq)]
    pub enum StorageArea {
        Session,
        Local,
    }

    /// web_sys::Storage envuelto
    pub struct BrowserStorage {
        storage: Storage,
        area: StorageArea,
    }

    impl BrowserStorage {
        /// None si el navegador no permite acceder al storage
        pub fn open(area: StorageArea) -> Option<Self> {
            let win = window()?;
            let storage = match area {
                StorageArea::Session => win.session_storage().ok()??,
                StorageArea::Local => win.local_storage().ok()??,
            };
            Some(Self { storage, area })
        }

        fn area_name(&self) -> &'static str {
            match self.area {
                StorageArea::Session => "sessionStorage",
                StorageArea::Local => "localStorage",
            }
        }
    }

    impl KeyValueStore for BrowserStorage {
        fn get_item(&self, key: &str) -> Option<String> {
            self.storage.get_item(key).ok()?
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
            self.storage
                .set_item(key, value)
                .map_err(|_| format!("Error guardando en {}", self.area_name()))
        }

        fn remove_item(&self, key: &str) -> Result<(), String> {
            self.storage
                .remove_item(key)
                .map_err(|_| format!("Error eliminando de {}", self.area_name()))
        }
    }
}
