// ============================================================================
// IMAGES VIEWMODEL - Galería del vuelo seleccionado
// ============================================================================

use std::rc::Rc;

use serde::Serialize;

use crate::error::ApiError;
use crate::models::flight::FlightImage;
use crate::services::PageCache;
use crate::state::ReactiveState;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GalleryView {
    pub flight: String,
    pub images: Vec<FlightImage>,
    pub total: usize,
    pub remaining: usize,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl GalleryView {
    /// Texto del botón "cargar más"
    pub fn load_more_label(&self) -> Option<String> {
        if !self.has_more {
            return None;
        }
        Some(format!("Cargar más ({} restantes)", self.remaining))
    }
}

#[derive(Clone)]
pub struct ImagesViewModel {
    cache: Rc<PageCache<FlightImage>>,
    view: ReactiveState<GalleryView>,
}

impl ImagesViewModel {
    pub fn new(cache: Rc<PageCache<FlightImage>>) -> Self {
        Self {
            cache,
            view: ReactiveState::new(GalleryView::default()),
        }
    }

    pub fn view(&self) -> ReactiveState<GalleryView> {
        self.view.clone()
    }

    /// Cambia de vuelo: descarta la galería anterior y carga la primera página.
    /// El mismo vuelo conserva las páginas ya cargadas.
    pub async fn select_flight(&self, flight: &str) -> Result<(), ApiError> {
        if !flight.is_empty() && self.cache.resource_key() == flight {
            log::debug!("🖼️ Vuelo {} ya seleccionado", flight);
            let result = self.cache.load_first_page(flight).await;
            self.publish();
            return result;
        }

        log::info!("🖼️ Vuelo seleccionado: {}", flight);
        self.view.update(|v| {
            v.flight = flight.to_string();
            v.images.clear();
            v.loading = !flight.is_empty();
            v.error = None;
        });
        let result = self.cache.reset(flight).await;
        self.publish();
        result
    }

    pub async fn load_more(&self) -> Result<(), ApiError> {
        if !self.cache.has_more() || self.cache.is_loading() {
            return Ok(());
        }
        self.view.update(|v| v.loading = true);
        let result = self.cache.load_next_page().await;
        self.publish();
        result
    }

    /// Reintento manual tras un error de red
    pub async fn retry(&self) -> Result<(), ApiError> {
        if self.cache.is_empty() {
            let flight = self.view.with(|v| v.flight.clone());
            let result = self.cache.load_first_page(&flight).await;
            self.publish();
            result
        } else {
            self.load_more().await
        }
    }

    /// Desmontaje de la vista
    pub fn clear(&self) {
        self.cache.clear();
        self.view.set(GalleryView::default());
    }

    fn publish(&self) {
        self.view.set(GalleryView {
            flight: self.cache.resource_key(),
            images: self.cache.items(),
            total: self.cache.total_count(),
            remaining: self.cache.remaining_count(),
            has_more: self.cache.has_more(),
            loading: self.cache.is_loading(),
            error: self.cache.error().map(|e| e.user_message()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pagination::Page;
    use crate::services::PageSource;
    use futures::executor::block_on;
    use futures::future::{self, LocalBoxFuture};
    use std::cell::RefCell;

    struct FakeImages {
        total: usize,
        fail_next: RefCell<Option<ApiError>>,
    }

    impl PageSource<FlightImage> for FakeImages {
        fn fetch_page(&self, key: &str, page: u32, limit: u32) -> LocalBoxFuture<'static, Result<Page<FlightImage>, ApiError>> {
            if let Some(error) = self.fail_next.borrow_mut().take() {
                return Box::pin(future::ready(Err(error)));
            }
            let start = ((page - 1) * limit) as usize;
            let end = (start + limit as usize).min(self.total);
            let items = (start..end)
                .map(|i| FlightImage {
                    id: format!("{}_{}_{}", key, page, i - start),
                    src: format!("https://bucket/{}.jpg", i),
                    thumbnail: format!("https://bucket/{}.jpg", i),
                    alt: String::new(),
                    name: format!("{}.jpg", i),
                    size: "1 KB".into(),
                    upload_date: String::new(),
                    key: String::new(),
                    etag: None,
                    page,
                })
                .collect();
            Box::pin(future::ready(Ok(Page {
                items,
                total: self.total,
                has_more: end < self.total,
            })))
        }
    }

    fn view_model(total: usize) -> (ImagesViewModel, Rc<FakeImages>) {
        let source = Rc::new(FakeImages { total, fail_next: RefCell::new(None) });
        let cache = Rc::new(PageCache::new(source.clone() as Rc<dyn PageSource<FlightImage>>, 9));
        (ImagesViewModel::new(cache), source)
    }

    #[test]
    fn test_gallery_paging() {
        let (vm, _) = view_model(25);
        block_on(vm.select_flight("Costa-20240101-0800")).unwrap();
        let view = vm.view().get();
        assert_eq!(view.images.len(), 9);
        assert_eq!(view.load_more_label().as_deref(), Some("Cargar más (16 restantes)"));
        assert!(!view.loading);

        block_on(vm.load_more()).unwrap();
        block_on(vm.load_more()).unwrap();
        let view = vm.view().get();
        assert_eq!(view.images.len(), 25);
        assert_eq!(view.load_more_label(), None);
    }

    #[test]
    fn test_reselecting_same_flight_keeps_loaded_pages() {
        let (vm, _) = view_model(25);
        block_on(vm.select_flight("Costa-20240101-0800")).unwrap();
        block_on(vm.load_more()).unwrap();
        assert_eq!(vm.view().get().images.len(), 18);

        block_on(vm.select_flight("Costa-20240101-0800")).unwrap();
        let view = vm.view().get();
        assert_eq!(view.images.len(), 18);
        assert_eq!(view.remaining, 7);
        assert_eq!(vm.cache.pages_loaded(), vec![1, 2]);

        block_on(vm.select_flight("Costa-20240102-0900")).unwrap();
        assert_eq!(vm.view().get().images.len(), 9);
    }

    #[test]
    fn test_error_is_readable_and_retry_recovers() {
        let (vm, source) = view_model(5);
        *source.fail_next.borrow_mut() = Some(ApiError::Network("offline".into()));

        assert!(block_on(vm.select_flight("Costa-20240101-0800")).is_err());
        let view = vm.view().get();
        assert!(view.images.is_empty());
        assert_eq!(view.error.as_deref(), Some("Error de conexión. Verifica tu conexión a internet."));

        block_on(vm.retry()).unwrap();
        let view = vm.view().get();
        assert_eq!(view.images.len(), 5);
        assert_eq!(view.error, None);
    }

    #[test]
    fn test_clear_resets_view() {
        let (vm, _) = view_model(3);
        block_on(vm.select_flight("Costa-20240101-0800")).unwrap();
        vm.clear();
        assert_eq!(vm.view().get(), GalleryView::default());
    }
}
