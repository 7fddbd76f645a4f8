use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::utils::constants::ACCESS_TOKEN_KEY;
use crate::utils::storage::KeyValueStore;

/// Token del proveedor de identidad, guardado en sessionStorage
#[derive(Clone)]
pub struct TokenHolder {
    store: Rc<dyn KeyValueStore>,
}

impl TokenHolder {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn get(&self) -> Option<String> {
        self.store
            .get_item(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    pub fn set(&self, token: &str) {
        if let Err(e) = self.store.set_item(ACCESS_TOKEN_KEY, token) {
            log::error!("❌ Error guardando token: {}", e);
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.remove_item(ACCESS_TOKEN_KEY) {
            log::error!("❌ Error eliminando token: {}", e);
        }
    }
}

/// Proveedor de identidad externo capaz de emitir un token nuevo
pub trait IdentityProvider {
    /// None si ya no hay sesión en el proveedor
    fn fresh_token(&self) -> LocalBoxFuture<'static, Option<String>>;
}
