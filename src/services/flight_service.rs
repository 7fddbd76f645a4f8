// ============================================================================
// VUELOS - Lista completa por ruta, paginada en cliente
// ============================================================================
// `list-flights` no pagina: se pide una vez por ruta, se ordena (más recientes
// primero) y se sirve por páginas desde memoria.
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::error::ApiError;
use crate::models::flight::{sort_newest_first, FlightFilter, FlightListPayload};
use crate::models::pagination::Page;
use crate::services::api_client::ApiClient;
use crate::services::page_cache::PageSource;
use crate::utils::format::encode_query_component;

type FlightLists = Rc<RefCell<HashMap<String, Rc<Vec<String>>>>>;

#[derive(Clone)]
pub struct FlightPageSource {
    api: ApiClient,
    lists: FlightLists,
}

impl FlightPageSource {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            lists: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Todos los vuelos de la ruta, ordenados. 404 -> lista vacía.
    pub async fn all_flights(&self, route: &str) -> Result<Rc<Vec<String>>, ApiError> {
        fetch_all(&self.api, &self.lists, route).await
    }

    /// Filtro por fecha sobre la lista completa, sin paginar
    pub async fn filtered(&self, route: &str, filter: &FlightFilter) -> Result<Vec<String>, ApiError> {
        let flights = self.all_flights(route).await?;
        let result = filter.apply(&flights);
        log::info!("🔎 Filtro {:?}: {} de {} vuelos", filter, result.len(), flights.len());
        Ok(result)
    }

    /// Olvida la lista de una ruta (p. ej. tras subir imágenes)
    pub fn invalidate(&self, route: &str) {
        self.lists.borrow_mut().remove(route);
    }
}

async fn fetch_all(api: &ApiClient, lists: &FlightLists, route: &str) -> Result<Rc<Vec<String>>, ApiError> {
    if let Some(cached) = lists.borrow().get(route) {
        return Ok(cached.clone());
    }

    let url = format!("{}/{}", api.endpoints().list_flights, encode_query_component(route));
    let mut flights = match api.get_json::<FlightListPayload>(&url).await {
        Ok(payload) => payload.into_names(),
        Err(ApiError::NotFound) => Vec::new(),
        Err(e) => return Err(e),
    };
    sort_newest_first(&mut flights);
    log::info!("✈️ {} vuelos en la ruta {}", flights.len(), route);

    let flights = Rc::new(flights);
    lists.borrow_mut().insert(route.to_string(), flights.clone());
    Ok(flights)
}

/// Página `page` (1-based) de tamaño `limit`
fn slice_page(flights: &[String], page: u32, limit: u32) -> Page<String> {
    let start = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
    let end = start.saturating_add(limit as usize).min(flights.len());
    Page {
        items: flights.get(start..end).map(<[String]>::to_vec).unwrap_or_default(),
        total: flights.len(),
        has_more: end < flights.len(),
    }
}

impl PageSource<String> for FlightPageSource {
    fn fetch_page(&self, route: &str, page: u32, limit: u32) -> LocalBoxFuture<'static, Result<Page<String>, ApiError>> {
        let api = self.api.clone();
        let lists = self.lists.clone();
        let route = route.to_string();
        Box::pin(async move {
            let flights = fetch_all(&api, &lists, &route).await?;
            Ok(slice_page(&flights, page, limit))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::page_cache::PageCache;
    use crate::services::token::TokenHolder;
    use crate::testing::MockTransport;
    use crate::utils::storage::MemoryStore;
    use chrono::NaiveDate;
    use futures::executor::block_on;

    fn flights_json(count: u32) -> String {
        let flights: Vec<String> = (1..=count).map(|day| format!("Costa-202401{:02}-0800", day)).collect();
        serde_json::json!({ "flights": flights }).to_string()
    }

    fn source(transport: Rc<MockTransport>) -> FlightPageSource {
        let api = ApiClient::new(transport, TokenHolder::new(Rc::new(MemoryStore::new())), &AppConfig::default());
        FlightPageSource::new(api)
    }

    #[test]
    fn test_pages_are_served_from_one_fetch() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(200, &flights_json(14));
        let cache: PageCache<String> = PageCache::new(Rc::new(source(transport.clone())), 12);

        block_on(cache.load_first_page("Costa")).unwrap();
        assert_eq!(cache.len(), 12);
        assert_eq!(cache.items()[0], "Costa-20240114-0800");
        assert_eq!(cache.remaining_count(), 2);

        block_on(cache.load_next_page()).unwrap();
        assert_eq!(cache.len(), 14);
        assert!(!cache.has_more());
        assert_eq!(cache.items()[13], "Costa-20240101-0800");
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_unknown_route_is_empty() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(404, r#"{"message":"Ruta no encontrada"}"#);
        let source = source(transport);

        let flights = block_on(source.all_flights("Nada")).unwrap();
        assert!(flights.is_empty());
    }

    #[test]
    fn test_filters_and_invalidate() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(200, r#"["Costa-20240105-0800","Costa-20240103-1000","Costa-20240103-0700"]"#);
        transport.respond(200, r#"["Costa-20240201-0800"]"#);
        let source = source(transport.clone());

        let day = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let same_day = block_on(source.filtered("Costa", &FlightFilter::SingleDay(day))).unwrap();
        assert_eq!(same_day, vec!["Costa-20240103-1000", "Costa-20240103-0700"]);

        let range = FlightFilter::Range { from: Some(day), to: None };
        assert_eq!(block_on(source.filtered("Costa", &range)).unwrap().len(), 3);
        assert_eq!(transport.requests().len(), 1);

        source.invalidate("Costa");
        assert_eq!(block_on(source.all_flights("Costa")).unwrap().len(), 1);
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_slice_page_bounds() {
        let flights: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        assert_eq!(slice_page(&flights, 3, 2).items, vec!["4"]);
        assert!(!slice_page(&flights, 3, 2).has_more);
        assert!(slice_page(&flights, 9, 2).items.is_empty());
    }
}
