// ============================================================================
// PAGE CACHE - Caché paginado con acumulación ("cargar más")
// ============================================================================
// Una instancia por vista. Las páginas se piden en orden (1, 2, 3...) y nunca
// dos veces para la misma clave. Cada petición lleva la generación vigente:
// si la clave cambió mientras tanto, la respuesta se descarta.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::error::ApiError;
use crate::models::pagination::Page;

/// Origen de páginas para una clave de recurso (vuelo, ruta...)
pub trait PageSource<T> {
    fn fetch_page(&self, key: &str, page: u32, limit: u32) -> LocalBoxFuture<'static, Result<Page<T>, ApiError>>;
}

struct CacheState<T> {
    resource_key: String,
    generation: u64,
    pages_loaded: Vec<u32>,
    items: Vec<T>,
    total_count: usize,
    has_more: bool,
    loading: bool,
    error: Option<ApiError>,
}

impl<T> CacheState<T> {
    fn empty(resource_key: &str, generation: u64) -> Self {
        Self {
            resource_key: resource_key.to_string(),
            generation,
            pages_loaded: Vec::new(),
            items: Vec::new(),
            total_count: 0,
            has_more: false,
            loading: false,
            error: None,
        }
    }
}

pub struct PageCache<T> {
    source: Rc<dyn PageSource<T>>,
    page_size: u32,
    state: RefCell<CacheState<T>>,
    on_auth_failure: RefCell<Option<Rc<dyn Fn()>>>,
}

impl<T: Clone + 'static> PageCache<T> {
    pub fn new(source: Rc<dyn PageSource<T>>, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            state: RefCell::new(CacheState::empty("", 0)),
            on_auth_failure: RefCell::new(None),
        }
    }

    /// Se invoca ante 401/403 (normalmente expira la sesión)
    pub fn on_auth_failure(&self, hook: impl Fn() + 'static) {
        *self.on_auth_failure.borrow_mut() = Some(Rc::new(hook));
    }

    pub async fn load_first_page(&self, key: &str) -> Result<(), ApiError> {
        if key.is_empty() {
            return Ok(());
        }

        let generation = {
            let mut state = self.state.borrow_mut();
            if state.resource_key == key && (state.loading || state.pages_loaded.contains(&1)) {
                log::debug!("📦 Página 1 de {} ya en caché o en curso", key);
                return Ok(());
            }
            if state.resource_key != key {
                let next = state.generation + 1;
                *state = CacheState::empty(key, next);
            }
            state.loading = true;
            state.error = None;
            state.generation
        };

        log::info!("📥 Cargando página 1 de {}", key);
        let result = self.source.fetch_page(key, 1, self.page_size).await;
        self.apply(generation, 1, result)
    }

    pub async fn load_next_page(&self) -> Result<(), ApiError> {
        let (key, generation, page) = {
            let mut state = self.state.borrow_mut();
            if state.resource_key.is_empty() || !state.has_more || state.loading {
                return Ok(());
            }
            let page = state.pages_loaded.last().copied().unwrap_or(0) + 1;
            state.loading = true;
            state.error = None;
            (state.resource_key.clone(), state.generation, page)
        };

        log::info!("📥 Cargando página {} de {}", page, key);
        let result = self.source.fetch_page(&key, page, self.page_size).await;
        self.apply(generation, page, result)
    }

    /// Descarta todo y, si hay clave nueva, carga su primera página
    pub async fn reset(&self, new_key: &str) -> Result<(), ApiError> {
        self.clear();
        self.load_first_page(new_key).await
    }

    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        let next = state.generation + 1;
        *state = CacheState::empty("", next);
    }

    pub fn remaining_count(&self) -> usize {
        let state = self.state.borrow();
        state.total_count.saturating_sub(state.items.len())
    }

    pub fn items(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_more(&self) -> bool {
        self.state.borrow().has_more
    }

    pub fn total_count(&self) -> usize {
        self.state.borrow().total_count
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<ApiError> {
        self.state.borrow().error.clone()
    }

    pub fn resource_key(&self) -> String {
        self.state.borrow().resource_key.clone()
    }

    pub fn pages_loaded(&self) -> Vec<u32> {
        self.state.borrow().pages_loaded.clone()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn apply(&self, generation: u64, page: u32, result: Result<Page<T>, ApiError>) -> Result<(), ApiError> {
        let error = {
            let mut state = self.state.borrow_mut();
            if state.generation != generation {
                log::debug!("🗑️ Respuesta de página {} descartada (clave cambiada)", page);
                return Ok(());
            }
            state.loading = false;

            match result {
                Ok(data) => {
                    if !state.pages_loaded.contains(&page) {
                        state.pages_loaded.push(page);
                        state.items.extend(data.items);
                    }
                    state.total_count = data.total.max(state.items.len());
                    state.has_more = data.has_more;
                    log::info!(
                        "✅ {} elementos de {} ({} cargados)",
                        state.total_count,
                        state.resource_key,
                        state.items.len()
                    );
                    return Ok(());
                }
                Err(error) if error.is_not_found() => {
                    log::info!("📭 Sin resultados para {}", state.resource_key);
                    if !state.pages_loaded.contains(&page) {
                        state.pages_loaded.push(page);
                    }
                    state.has_more = false;
                    state.total_count = state.items.len();
                    return Ok(());
                }
                Err(error) => {
                    log::error!("❌ Error cargando página {} de {}: {}", page, state.resource_key, error);
                    state.error = Some(error.clone());
                    error
                }
            }
        };

        if error.is_auth_expired() {
            let hook = self.on_auth_failure.borrow().clone();
            if let Some(hook) = hook {
                hook();
            }
        }
        Err(error)
    }
}
