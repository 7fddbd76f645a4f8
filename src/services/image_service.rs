use std::rc::Rc;

use chrono::{TimeZone, Utc};
use futures::future::LocalBoxFuture;

use crate::error::ApiError;
use crate::models::flight::{FlightImage, ImageListResponse};
use crate::models::pagination::Page;
use crate::services::api_client::ApiClient;
use crate::services::page_cache::PageSource;
use crate::utils::format::encode_query_component;
use crate::utils::time::Clock;

/// Imágenes de un vuelo, paginadas por el servidor
pub struct ImagePageSource {
    api: ApiClient,
    clock: Rc<dyn Clock>,
}

impl ImagePageSource {
    pub fn new(api: ApiClient, clock: Rc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    fn page_url(&self, flight: &str, page: u32, limit: u32) -> String {
        format!(
            "{}/{}?page={}&limit={}",
            self.api.endpoints().list_images,
            encode_query_component(flight),
            page,
            limit
        )
    }
}

impl PageSource<FlightImage> for ImagePageSource {
    fn fetch_page(&self, flight: &str, page: u32, limit: u32) -> LocalBoxFuture<'static, Result<Page<FlightImage>, ApiError>> {
        let api = self.api.clone();
        let url = self.page_url(flight, page, limit);
        let flight = flight.to_string();
        let fallback_date = Utc
            .timestamp_millis_opt(self.clock.now_ms())
            .single()
            .map(|now| now.to_rfc3339())
            .unwrap_or_default();

        Box::pin(async move {
            let response: ImageListResponse = api.get_json(&url).await?;
            let received = response.images.len();
            let items: Vec<FlightImage> = response
                .images
                .into_iter()
                .enumerate()
                .map(|(index, entry)| FlightImage::from_entry(&flight, page, index, entry, &fallback_date))
                .collect();

            // sin total del servidor, lo visto hasta ahora
            let seen = (page.saturating_sub(1) as usize)
                .saturating_mul(limit as usize)
                .saturating_add(received);
            log::info!("🖼️ {} imágenes en página {} de {}", received, page, flight);

            Ok(Page {
                items,
                total: response.pagination.total.max(seen),
                has_more: response.pagination.has_next_page,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::page_cache::PageCache;
    use crate::services::token::TokenHolder;
    use crate::testing::{ManualClock, MockTransport};
    use crate::utils::storage::MemoryStore;
    use futures::executor::block_on;

    fn images_body(names: &[&str], total: usize, has_next: bool) -> String {
        let images: Vec<serde_json::Value> = names
            .iter()
            .map(|name| {
                serde_json::json!({
                    "url": format!("https://bucket/{}", name),
                    "filename": name,
                    "size": 1536,
                    "key": format!("Costa/{}", name),
                })
            })
            .collect();
        serde_json::json!({
            "images": images,
            "pagination": { "current_page": 1, "total_images": total, "has_next_page": has_next }
        })
        .to_string()
    }

    fn source(transport: Rc<MockTransport>) -> ImagePageSource {
        let config = AppConfig::default();
        let api = ApiClient::new(transport, TokenHolder::new(Rc::new(MemoryStore::new())), &config);
        ImagePageSource::new(api, Rc::new(ManualClock::new(1_704_067_200_000)))
    }

    #[test]
    fn test_transforms_page_entries() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(200, &images_body(&["a.jpg", "b.jpg"], 11, true));
        let source = source(transport.clone());

        let page = block_on(source.fetch_page("Costa-20240101-0800", 2, 9)).unwrap();
        assert_eq!(page.total, 11);
        assert!(page.has_more);
        assert_eq!(page.items[1].id, "Costa-20240101-0800_2_1");
        assert_eq!(page.items[0].size, "1.5 KB");
        assert_eq!(page.items[0].upload_date, "2024-01-01T00:00:00+00:00");
        assert!(transport.urls()[0].ends_with("/list-images/Costa-20240101-0800?page=2&limit=9"));
    }

    #[test]
    fn test_seen_count_on_huge_page_numbers_does_not_overflow() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(200, &images_body(&["a.jpg"], 0, false));
        let source = source(transport);

        let page = block_on(source.fetch_page("Costa-20240101-0800", u32::MAX, 1000)).unwrap();
        let expected = ((u32::MAX - 1) as usize).saturating_mul(1000).saturating_add(1);
        assert_eq!(page.total, expected);
    }

    #[test]
    fn test_missing_images_array_is_malformed() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(200, r#"{"pagination":{}}"#);
        let source = source(transport);

        let result = block_on(source.fetch_page("Costa-20240101-0800", 1, 9));
        assert!(matches!(result, Err(ApiError::MalformedResponse(_))));
    }

    #[test]
    fn test_feeds_page_cache_through_wrapped_body() {
        let transport = Rc::new(MockTransport::new());
        let first: Vec<String> = (0..9).map(|i| format!("{}.jpg", i)).collect();
        let first: Vec<&str> = first.iter().map(String::as_str).collect();
        let wrapped = serde_json::json!({ "body": images_body(&first, 10, true) }).to_string();
        transport.respond(200, &wrapped);
        transport.respond(200, &images_body(&["9.jpg"], 10, false));

        let cache: PageCache<FlightImage> = PageCache::new(Rc::new(source(transport)), 9);
        block_on(cache.load_first_page("Costa-20240101-0800")).unwrap();
        assert_eq!(cache.remaining_count(), 1);
        block_on(cache.load_next_page()).unwrap();
        assert_eq!(cache.len(), 10);
        assert!(!cache.has_more());
        assert_eq!(cache.items()[9].id, "Costa-20240101-0800_2_0");
    }
}
