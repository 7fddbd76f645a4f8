// ============================================================================
// FLIGHTS VIEWMODEL - Selección de vuelo dentro de una ruta
// ============================================================================

use std::rc::Rc;

use crate::error::ApiError;
use crate::models::flight::FlightFilter;
use crate::services::{FlightPageSource, PageCache};
use crate::state::ReactiveState;

#[derive(Debug, Clone, PartialEq)]
pub struct FlightListView {
    pub route: String,
    pub flights: Vec<String>,
    pub remaining: usize,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub filter: FlightFilter,
    /// Resultado del filtro por fecha (sin paginar); None sin filtro
    pub filtered: Option<Vec<String>>,
}

impl Default for FlightListView {
    fn default() -> Self {
        Self {
            route: String::new(),
            flights: Vec::new(),
            remaining: 0,
            has_more: false,
            loading: false,
            error: None,
            filter: FlightFilter::All,
            filtered: None,
        }
    }
}

impl FlightListView {
    /// Lo que la lista muestra: el filtro si lo hay, si no las páginas cargadas
    pub fn visible(&self) -> &[String] {
        self.filtered.as_deref().unwrap_or(&self.flights)
    }
}

#[derive(Clone)]
pub struct FlightsViewModel {
    source: FlightPageSource,
    cache: Rc<PageCache<String>>,
    view: ReactiveState<FlightListView>,
}

impl FlightsViewModel {
    pub fn new(source: FlightPageSource, page_size: u32) -> Self {
        let cache: Rc<PageCache<String>> = Rc::new(PageCache::new(Rc::new(source.clone()), page_size));
        Self {
            source,
            cache,
            view: ReactiveState::new(FlightListView::default()),
        }
    }

    pub fn cache(&self) -> Rc<PageCache<String>> {
        self.cache.clone()
    }

    pub fn view(&self) -> ReactiveState<FlightListView> {
        self.view.clone()
    }

    /// La misma ruta conserva páginas y filtro
    pub async fn select_route(&self, route: &str) -> Result<(), ApiError> {
        if !route.is_empty() && self.cache.resource_key() == route {
            log::debug!("🗺️ Ruta {} ya seleccionada", route);
            let result = self.cache.load_first_page(route).await;
            self.publish();
            return result;
        }
        self.reload(route).await
    }

    async fn reload(&self, route: &str) -> Result<(), ApiError> {
        log::info!("🗺️ Ruta seleccionada: {}", route);
        self.view.set(FlightListView {
            route: route.to_string(),
            loading: !route.is_empty(),
            ..Default::default()
        });
        let result = self.cache.reset(route).await;
        self.publish();
        result
    }

    pub async fn load_more(&self) -> Result<(), ApiError> {
        let result = self.cache.load_next_page().await;
        self.publish();
        result
    }

    pub async fn apply_filter(&self, filter: FlightFilter) -> Result<(), ApiError> {
        let route = self.cache.resource_key();
        if route.is_empty() || matches!(filter, FlightFilter::All) {
            self.view.update(|v| {
                v.filter = FlightFilter::All;
                v.filtered = None;
            });
            return Ok(());
        }

        match self.source.filtered(&route, &filter).await {
            Ok(flights) => {
                self.view.update(|v| {
                    v.filter = filter;
                    v.filtered = Some(flights);
                    v.error = None;
                });
                Ok(())
            }
            Err(e) => {
                self.view.update(|v| v.error = Some(e.user_message()));
                Err(e)
            }
        }
    }

    pub fn clear_filter(&self) {
        self.view.update(|v| {
            v.filter = FlightFilter::All;
            v.filtered = None;
        });
    }

    /// Tras subir imágenes la lista del servidor puede haber cambiado
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let route = self.cache.resource_key();
        self.source.invalidate(&route);
        self.reload(&route).await
    }

    fn publish(&self) {
        let flights = self.cache.items();
        let remaining = self.cache.remaining_count();
        let has_more = self.cache.has_more();
        let loading = self.cache.is_loading();
        let error = self.cache.error().map(|e| e.user_message());
        let route = self.cache.resource_key();
        self.view.update(|v| {
            v.route = route;
            v.flights = flights;
            v.remaining = remaining;
            v.has_more = has_more;
            v.loading = loading;
            v.error = error;
        });
    }
}
