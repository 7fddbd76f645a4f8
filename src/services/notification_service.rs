// ============================================================================
// NOTIFICATION SERVICE - Alertas del análisis de imágenes
// ============================================================================

use futures::future::join_all;

use crate::error::ApiError;
use crate::models::notification::{
    detect_new, filter_valid, FeedbackRequest, ImageUrlResponse, NewNotificationsCheck, Notification,
    NotificationEnvelope, NotificationQuery, NotificationStats, NotificationStatus, NotificationsResponse,
};
use crate::services::api_client::ApiClient;
use crate::utils::format::encode_query_component;

#[derive(Clone)]
pub struct NotificationService {
    api: ApiClient,
}

impl NotificationService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/notifications{}", self.api.endpoints().notifications, path)
    }

    fn query_string(query: &NotificationQuery) -> String {
        let mut params = Vec::new();
        if let Some(limit) = query.limit {
            params.push(format!("limit={}", limit));
        }
        if let Some(last_key) = &query.last_key {
            params.push(format!("last_key={}", encode_query_component(last_key)));
        }
        if let Some(status) = query.status {
            let status = match status {
                NotificationStatus::Unread => "UNREAD",
                NotificationStatus::Read => "READ",
            };
            params.push(format!("status={}", status));
        }

        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }

    /// 404 -> lista vacía. Las notificaciones incompletas se descartan.
    pub async fn get_notifications(&self, query: &NotificationQuery) -> Result<NotificationsResponse, ApiError> {
        let url = self.url(&Self::query_string(query));
        match self.api.get_json::<NotificationsResponse>(&url).await {
            Ok(mut response) => {
                let received = response.notifications.len();
                response.notifications = filter_valid(response.notifications);
                if response.notifications.len() < received {
                    log::warn!(
                        "⚠️ {} notificaciones inválidas descartadas",
                        received - response.notifications.len()
                    );
                }
                Ok(response)
            }
            Err(ApiError::NotFound) => {
                log::info!("📭 Sin notificaciones");
                Ok(NotificationsResponse::default())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn mark_as_read(&self, notification_id: &str) -> Result<Notification, ApiError> {
        let url = self.url(&format!("/{}/read", encode_query_component(notification_id)));
        let envelope: NotificationEnvelope = self.api.post_empty(&url).await?;
        Ok(envelope.notification)
    }

    /// En paralelo; un resultado por id, en el mismo orden
    pub async fn mark_multiple_as_read(&self, ids: &[String]) -> Vec<Result<Notification, ApiError>> {
        join_all(ids.iter().map(|id| self.mark_as_read(id))).await
    }

    pub async fn add_feedback(&self, notification_id: &str, is_useful: bool, comments: &str) -> Result<Notification, ApiError> {
        let url = self.url(&format!("/{}/feedback", encode_query_component(notification_id)));
        let request = FeedbackRequest {
            is_useful,
            comments: comments.trim().to_string(),
        };
        let envelope: NotificationEnvelope = self.api.post_json(&url, &request).await?;
        log::info!("💬 Feedback enviado para {} (útil: {})", notification_id, is_useful);
        Ok(envelope.notification)
    }

    /// 404 -> estadísticas a cero
    pub async fn get_stats(&self) -> Result<NotificationStats, ApiError> {
        match self.api.get_json(&self.url("/stats")).await {
            Err(ApiError::NotFound) => Ok(NotificationStats::default()),
            other => other,
        }
    }

    pub async fn get_image_url(&self, notification_id: &str) -> Result<String, ApiError> {
        let url = self.url(&format!("/{}/image", encode_query_component(notification_id)));
        let response: ImageUrlResponse = self.api.get_json(&url).await?;
        Ok(response.image_url)
    }

    /// Compara las `limit` más recientes con la última conocida. Un error cuenta como "nada nuevo".
    pub async fn check_for_new(&self, last_known_id: Option<&str>, limit: u32) -> NewNotificationsCheck {
        let query = NotificationQuery {
            limit: Some(limit),
            ..Default::default()
        };
        match self.get_notifications(&query).await {
            Ok(response) => detect_new(response.notifications, last_known_id),
            Err(e) => {
                log::warn!("⚠️ Error comprobando notificaciones nuevas: {}", e);
                NewNotificationsCheck::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::token::TokenHolder;
    use crate::testing::MockTransport;
    use crate::utils::storage::MemoryStore;
    use futures::executor::block_on;
    use std::rc::Rc;

    fn service(transport: Rc<MockTransport>) -> NotificationService {
        let api = ApiClient::new(transport, TokenHolder::new(Rc::new(MemoryStore::new())), &AppConfig::default());
        NotificationService::new(api)
    }

    fn notification_json(id: &str, status: &str) -> serde_json::Value {
        serde_json::json!({
            "notification_id": id,
            "client": "cliente",
            "created_at": "2024-01-01T00:00:00Z",
            "status": status,
        })
    }

    #[test]
    fn test_query_string() {
        let query = NotificationQuery {
            limit: Some(20),
            last_key: Some(r#"{"id":"n 1"}"#.into()),
            status: Some(NotificationStatus::Unread),
        };
        assert_eq!(
            NotificationService::query_string(&query),
            "?limit=20&last_key=%7B%22id%22%3A%22n%201%22%7D&status=UNREAD"
        );
        assert_eq!(NotificationService::query_string(&NotificationQuery::default()), "");
    }

    #[test]
    fn test_not_found_is_empty_and_invalid_are_dropped() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(404, "");
        let body = serde_json::json!({
            "notifications": [notification_json("n1", "UNREAD"), { "notification_id": "n2" }],
            "count": 2,
            "has_more": false
        });
        transport.respond(200, &body.to_string());
        let service = service(transport.clone());

        let empty = block_on(service.get_notifications(&NotificationQuery::default())).unwrap();
        assert!(empty.notifications.is_empty());

        let response = block_on(service.get_notifications(&NotificationQuery::default())).unwrap();
        assert_eq!(response.notifications.len(), 1);
        assert!(transport.urls()[0].ends_with("/notifications"));
    }

    #[test]
    fn test_feedback_trims_comments() {
        let transport = Rc::new(MockTransport::new());
        let body = serde_json::json!({ "notification": notification_json("n1", "READ") });
        transport.respond(200, &body.to_string());
        let service = service(transport.clone());

        let updated = block_on(service.add_feedback("n1", false, "  falso positivo \n")).unwrap();
        assert_eq!(updated.status, NotificationStatus::Read);

        let request = &transport.requests()[0];
        assert!(request.url.ends_with("/notifications/n1/feedback"));
        assert_eq!(
            request.body.as_deref(),
            Some(br#"{"is_useful":false,"comments":"falso positivo"}"#.as_slice())
        );
    }

    #[test]
    fn test_mark_multiple_keeps_order_and_errors() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(200, &serde_json::json!({ "notification": notification_json("a", "READ") }).to_string());
        transport.respond(500, "");
        let service = service(transport.clone());

        let results = block_on(service.mark_multiple_as_read(&["a".to_string(), "b".to_string()]));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().map(|n| n.notification_id.clone()), Ok("a".to_string()));
        assert!(results[1].is_err());
    }

    #[test]
    fn test_stats_and_check_for_new_degrade_gracefully() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(404, "");
        transport.respond(503, "");
        let service = service(transport.clone());

        assert_eq!(block_on(service.get_stats()).unwrap(), NotificationStats::default());
        assert_eq!(block_on(service.check_for_new(Some("n1"), 5)), NewNotificationsCheck::default());
        assert!(transport.urls()[1].ends_with("/notifications?limit=5"));
    }
}
