// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP
// ============================================================================
// Credencial bearer, timeout, reintento ante 429 y clasificación de errores.
// No conoce endpoints concretos; eso vive en cada servicio.
// ============================================================================

use std::rc::Rc;

use futures::future::{select, Either};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{AppConfig, EndpointConfig};
use crate::error::ApiError;
use crate::models::pagination::decode_payload;
use crate::services::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::services::session_clock::SessionGate;
use crate::services::token::{IdentityProvider, TokenHolder};
use crate::utils::constants::MAX_BACKOFF_MS;

/// min(1000 * 2^n, 10000) ms
pub fn backoff_delay_ms(retry: u32) -> u32 {
    1000u32
        .saturating_mul(1u32 << retry.min(16))
        .min(MAX_BACKOFF_MS)
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Rc<dyn HttpTransport>,
    tokens: TokenHolder,
    session: Option<Rc<dyn SessionGate>>,
    identity: Option<Rc<dyn IdentityProvider>>,
    endpoints: EndpointConfig,
    timeout_ms: u32,
    retry_attempts: u32,
}

impl ApiClient {
    pub fn new(transport: Rc<dyn HttpTransport>, tokens: TokenHolder, config: &AppConfig) -> Self {
        Self {
            transport,
            tokens,
            session: None,
            identity: None,
            endpoints: config.endpoints.clone(),
            timeout_ms: config.network_timeout_ms(),
            retry_attempts: config.retry_attempts,
        }
    }

    /// Las peticiones se rechazan en local si la sesión ya expiró
    pub fn with_session_gate(mut self, gate: Rc<dyn SessionGate>) -> Self {
        self.session = Some(gate);
        self
    }

    pub fn with_identity_provider(mut self, provider: Rc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let body = self.execute(HttpRequest::get(url)).await?;
        decode_payload(&body)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, payload: &B) -> Result<T, ApiError> {
        let body = self.execute(HttpRequest::post_json(url, payload)?).await?;
        decode_payload(&body)
    }

    /// POST sin cuerpo (mark-read)
    pub async fn post_empty<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        self.post_json(url, &serde_json::json!({})).await
    }

    /// PUT directo al almacenamiento: sin credencial bearer ni reintentos
    pub async fn put_object(&self, url: &str, content_type: &str, bytes: Vec<u8>) -> Result<(), ApiError> {
        let response = self
            .send_with_timeout(HttpRequest::put_bytes(url, content_type, bytes))
            .await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(ApiError::from_status(response.status, &response.body, response.retry_after))
        }
    }

    /// Petición autenticada. Devuelve el cuerpo de una respuesta 2xx.
    pub async fn execute(&self, request: HttpRequest) -> Result<String, ApiError> {
        if let Some(gate) = &self.session {
            if !gate.is_active() {
                log::warn!("⏰ Sesión local expirada, petición cancelada: {}", request.url);
                return Err(ApiError::Unauthorized);
            }
        }

        let mut token = self.tokens.get();
        let mut refreshed = false;
        let mut rate_limit_retries = 0;

        loop {
            let attempt = match &token {
                Some(token) => request.clone().with_bearer(token),
                None => request.clone(),
            };

            let response = self.send_with_timeout(attempt).await?;
            if response.is_success() {
                return Ok(response.body);
            }

            let error = ApiError::from_status(response.status, &response.body, response.retry_after);
            match error {
                ApiError::Unauthorized | ApiError::Forbidden => {
                    self.tokens.clear();

                    if !refreshed {
                        refreshed = true;
                        if let Some(fresh) = self.refresh_token().await {
                            log::info!("🔑 Token renovado, reintentando {}", request.url);
                            token = Some(fresh);
                            continue;
                        }
                    }

                    log::warn!("🔒 {} en {}: sesión inválida", response.status, request.url);
                    if let Some(gate) = &self.session {
                        gate.expire();
                    }
                    return Err(error);
                }
                ApiError::RateLimited { .. } if rate_limit_retries < self.retry_attempts => {
                    let delay = backoff_delay_ms(rate_limit_retries);
                    rate_limit_retries += 1;
                    log::warn!(
                        "⏳ 429 en {}, reintento {}/{} en {} ms",
                        request.url,
                        rate_limit_retries,
                        self.retry_attempts,
                        delay
                    );
                    self.transport.sleep(delay).await;
                }
                other => {
                    log::error!("❌ Error HTTP {} en {}: {}", response.status, request.url, other);
                    return Err(other);
                }
            }
        }
    }

    async fn refresh_token(&self) -> Option<String> {
        let provider = self.identity.as_ref()?;
        let fresh = provider.fresh_token().await?;
        self.tokens.set(&fresh);
        Some(fresh)
    }

    async fn send_with_timeout(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.clone();
        let send = self.transport.send(request);
        let timer = self.transport.sleep(self.timeout_ms);

        match select(send, timer).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => {
                log::error!("⏱️ Timeout de {} ms en {}", self.timeout_ms, url);
                Err(ApiError::Timeout(self.timeout_ms))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, ManualScheduler, MockTransport, StaticIdentity};
    use crate::services::session_clock::SessionClock;
    use crate::utils::storage::{KeyValueStore, MemoryStore};
    use futures::executor::block_on;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Routes {
        routes: Vec<String>,
    }

    fn client(transport: Rc<MockTransport>) -> (ApiClient, TokenHolder) {
        let tokens = TokenHolder::new(Rc::new(MemoryStore::new()));
        tokens.set("token-1");
        let api = ApiClient::new(transport, tokens.clone(), &AppConfig::default());
        (api, tokens)
    }

    fn backoffs(transport: &MockTransport) -> Vec<u32> {
        transport.sleeps().into_iter().filter(|ms| *ms < 30_000).collect()
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay_ms(0), 1000);
        assert_eq!(backoff_delay_ms(1), 2000);
        assert_eq!(backoff_delay_ms(2), 4000);
        assert_eq!(backoff_delay_ms(3), 8000);
        assert_eq!(backoff_delay_ms(4), 10_000);
        assert_eq!(backoff_delay_ms(40), 10_000);
    }

    #[test]
    fn test_attaches_bearer_and_unwraps_envelope() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(200, r#"{"statusCode":200,"body":"{\"routes\":[\"Costa\"]}"}"#);
        let (api, _) = client(transport.clone());

        let routes: Routes = block_on(api.get_json("http://api/list-routes")).unwrap();
        assert_eq!(routes.routes, vec!["Costa"]);

        let requests = transport.requests();
        assert_eq!(requests[0].header("Authorization"), Some("Bearer token-1"));
    }

    #[test]
    fn test_rate_limit_backs_off_then_succeeds() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(429, "");
        transport.respond(429, "");
        transport.respond(200, r#"{"routes":[]}"#);
        let (api, _) = client(transport.clone());

        let routes: Routes = block_on(api.get_json("http://api/list-routes")).unwrap();
        assert!(routes.routes.is_empty());
        assert_eq!(backoffs(&transport), vec![1000, 2000]);
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn test_rate_limit_gives_up_after_configured_attempts() {
        let transport = Rc::new(MockTransport::new());
        for _ in 0..4 {
            transport.respond(429, "");
        }
        let (api, _) = client(transport.clone());

        let result: Result<Routes, _> = block_on(api.get_json("http://api/list-routes"));
        assert!(matches!(result, Err(ApiError::RateLimited { .. })));
        assert_eq!(backoffs(&transport), vec![1000, 2000, 4000]);
        assert_eq!(transport.requests().len(), 4);
    }

    #[test]
    fn test_unauthorized_without_provider_clears_token_and_expires_session() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(401, "");
        let session_store: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        let clock = Rc::new(ManualClock::new(0));
        let scheduler = Rc::new(ManualScheduler::new());
        let session = SessionClock::new(Default::default(), clock, session_store.clone(), scheduler);
        session.start();

        let expired = Rc::new(std::cell::Cell::new(0));
        let counter = expired.clone();
        session.on_expire(move || counter.set(counter.get() + 1));

        let tokens = TokenHolder::new(session_store);
        tokens.set("stale");
        let api = ApiClient::new(transport.clone(), tokens.clone(), &AppConfig::default())
            .with_session_gate(Rc::new(session.clone()));

        let result: Result<Routes, _> = block_on(api.get_json("http://api/list-routes"));
        assert_eq!(result, Err(ApiError::Unauthorized));
        assert_eq!(tokens.get(), None);
        assert_eq!(expired.get(), 1);
        assert!(!session.is_active());
        assert_eq!(transport.requests().len(), 1);

        // sesión local expirada: ni siquiera sale a la red
        let result: Result<Routes, _> = block_on(api.get_json("http://api/list-routes"));
        assert_eq!(result, Err(ApiError::Unauthorized));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_forbidden_retries_once_with_fresh_token() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(403, "");
        transport.respond(200, r#"{"routes":["Sur"]}"#);
        let (api, tokens) = client(transport.clone());
        let api = api.with_identity_provider(Rc::new(StaticIdentity::new(Some("token-2"))));

        let routes: Routes = block_on(api.get_json("http://api/list-routes")).unwrap();
        assert_eq!(routes.routes, vec!["Sur"]);
        assert_eq!(tokens.get().as_deref(), Some("token-2"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].header("Authorization"), Some("Bearer token-2"));
    }

    #[test]
    fn test_second_auth_failure_is_not_retried() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(401, "");
        transport.respond(401, "");
        let (api, _) = client(transport.clone());
        let api = api.with_identity_provider(Rc::new(StaticIdentity::new(Some("token-2"))));

        let result: Result<Routes, _> = block_on(api.get_json("http://api/list-routes"));
        assert_eq!(result, Err(ApiError::Unauthorized));
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_timeout_and_malformed() {
        let transport = Rc::new(MockTransport::new());
        transport.hang();
        transport.respond(200, r#"{"rutas":[]}"#);
        let (api, _) = client(transport.clone());

        let result: Result<Routes, _> = block_on(api.get_json("http://api/list-routes"));
        assert_eq!(result, Err(ApiError::Timeout(30_000)));

        let result: Result<Routes, _> = block_on(api.get_json("http://api/list-routes"));
        assert!(matches!(result, Err(ApiError::MalformedResponse(_))));
    }

    #[test]
    fn test_put_object_has_no_bearer() {
        let transport = Rc::new(MockTransport::new());
        transport.respond(200, "");
        let (api, _) = client(transport.clone());

        block_on(api.put_object("https://s3/presigned", "image/jpeg", vec![1, 2, 3])).unwrap();
        let request = &transport.requests()[0];
        assert_eq!(request.header("Authorization"), None);
        assert_eq!(request.header("Content-Type"), Some("image/jpeg"));
    }
}
