// ============================================================================
// HTTP TRANSPORT - Frontera con la red
// ============================================================================
// El transporte solo falla por red; cualquier código HTTP llega como respuesta
// y se clasifica en ApiClient.
// ============================================================================

use futures::future::LocalBoxFuture;
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json<B: Serialize>(url: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| ApiError::MalformedResponse(format!("Error serializando petición: {}", e)))?;
        Ok(Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(bytes),
        })
    }

    /// PUT binario (subida a URL prefirmada)
    pub fn put_bytes(url: impl Into<String>, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            method: HttpMethod::Put,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: Some(bytes),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Cabecera Retry-After en segundos
    pub retry_after: Option<u64>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait HttpTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, ApiError>>;

    /// Espera sin bloquear (backoff y timeouts)
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}

#[cfg(target_arch = "wasm32")]
pub use browser::GlooTransport;

#[cfg(target_arch = "wasm32")]
mod browser {
    use futures::future::LocalBoxFuture;
    use gloo_net::http::{Request, RequestBuilder};

    use super::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
    use crate::error::ApiError;

    /// fetch() del navegador vía gloo-net
    #[derive(Clone, Copy, Default)]
    pub struct GlooTransport;

    impl GlooTransport {
        pub fn new() -> Self {
            Self
        }
    }

    impl HttpTransport for GlooTransport {
        fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, ApiError>> {
            Box::pin(async move {
                let mut builder: RequestBuilder = match request.method {
                    HttpMethod::Get => Request::get(&request.url),
                    HttpMethod::Post => Request::post(&request.url),
                    HttpMethod::Put => Request::put(&request.url),
                };
                for (name, value) in &request.headers {
                    builder = builder.header(name, value);
                }

                let prepared = match request.body {
                    Some(bytes) => builder.body(js_sys::Uint8Array::from(bytes.as_slice())),
                    None => builder.build(),
                }
                .map_err(|e| ApiError::Network(format!("Error preparando petición: {}", e)))?;

                let response = prepared
                    .send()
                    .await
                    .map_err(|e| ApiError::Network(e.to_string()))?;

                let status = response.status();
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.trim().parse::<u64>().ok());
                let body = response.text().await.unwrap_or_default();

                Ok(HttpResponse {
                    status,
                    body,
                    retry_after,
                })
            })
        }

        fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
            Box::pin(gloo_timers::future::TimeoutFuture::new(ms))
        }
    }
}
