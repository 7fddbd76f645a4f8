use serde::{Deserialize, Serialize};

use crate::models::notification::FeedbackPolicy;
use crate::utils::constants::API_BASE_URL;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub enable_logging: bool,
    pub network_timeout_seconds: u32,
    pub retry_attempts: u32,
    pub endpoints: EndpointConfig,
    pub session: SessionConfig,
    pub paging: PagingConfig,
    pub feedback_policy: FeedbackPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            enable_logging: true,
            network_timeout_seconds: 30,
            retry_attempts: 3,
            endpoints: EndpointConfig::from_base(API_BASE_URL),
            session: SessionConfig::default(),
            paging: PagingConfig::default(),
            feedback_policy: FeedbackPolicy::default(),
        }
    }
}

/// URLs de los endpoints del API Gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub list_routes: String,
    pub create_route: String,
    pub list_flights: String,
    pub list_images: String,
    pub upload_image: String,
    pub notifications: String,
}

impl EndpointConfig {
    /// Todos los endpoints bajo una misma base
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            list_routes: format!("{}/list-routes", base),
            create_route: format!("{}/create-route", base),
            list_flights: format!("{}/list-flights", base),
            list_images: format!("{}/list-images", base),
            upload_image: format!("{}/upload-image", base),
            notifications: base.to_string(),
        }
    }
}

/// Duraciones del reloj de sesión (todas en milisegundos)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub duration_ms: i64,
    pub warning_ms: i64,
    pub check_interval_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 8 * 60 * 60 * 1000,
            warning_ms: 5 * 60 * 1000,
            check_interval_ms: 60 * 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagingConfig {
    pub images_page_size: u32,
    pub flights_page_size: u32,
    pub notifications_page_size: u32,
    pub notifications_check_limit: u32,
    pub notifications_poll_ms: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            images_page_size: 9,
            flights_page_size: 12,
            notifications_page_size: 20,
            notifications_check_limit: 5,
            notifications_poll_ms: 60 * 1000,
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno en tiempo de compilación
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base = option_env!("API_BASE_URL").unwrap_or(API_BASE_URL);
        let mut endpoints = EndpointConfig::from_base(base);

        if let Some(url) = option_env!("LIST_ROUTES_URL") {
            endpoints.list_routes = url.to_string();
        }
        if let Some(url) = option_env!("CREATE_ROUTE_URL") {
            endpoints.create_route = url.to_string();
        }
        if let Some(url) = option_env!("LIST_FLIGHTS_URL") {
            endpoints.list_flights = url.to_string();
        }
        if let Some(url) = option_env!("LIST_IMAGES_URL") {
            endpoints.list_images = url.to_string();
        }
        if let Some(url) = option_env!("UPLOAD_IMAGE_URL") {
            endpoints.upload_image = url.to_string();
        }
        if let Some(url) = option_env!("NOTIFICATIONS_URL") {
            endpoints.notifications = url.to_string();
        }

        Self {
            environment: option_env!("ENVIRONMENT")
                .unwrap_or("development").to_string(),
            enable_logging: option_env!("ENABLE_LOGGING")
                .unwrap_or("true").parse().unwrap_or(true),
            network_timeout_seconds: option_env!("NETWORK_TIMEOUT_SECONDS")
                .unwrap_or("30").parse().unwrap_or(30),
            retry_attempts: option_env!("RETRY_ATTEMPTS")
                .unwrap_or("3").parse().unwrap_or(3),
            endpoints,
            session: SessionConfig {
                duration_ms: minutes_env(option_env!("SESSION_DURATION_MINUTES"))
                    .unwrap_or(defaults.session.duration_ms),
                warning_ms: minutes_env(option_env!("SESSION_WARNING_MINUTES"))
                    .unwrap_or(defaults.session.warning_ms),
                check_interval_ms: option_env!("SESSION_CHECK_INTERVAL_SECONDS")
                    .and_then(|s| s.parse::<u32>().ok())
                    .map(|secs| secs * 1000)
                    .unwrap_or(defaults.session.check_interval_ms),
            },
            paging: PagingConfig {
                images_page_size: option_env!("IMAGES_PAGE_SIZE")
                    .unwrap_or("9").parse().unwrap_or(9),
                flights_page_size: option_env!("FLIGHTS_PAGE_SIZE")
                    .unwrap_or("12").parse().unwrap_or(12),
                notifications_page_size: option_env!("NOTIFICATIONS_PAGE_SIZE")
                    .unwrap_or("20").parse().unwrap_or(20),
                notifications_check_limit: defaults.paging.notifications_check_limit,
                notifications_poll_ms: option_env!("NOTIFICATIONS_POLL_SECONDS")
                    .and_then(|s| s.parse::<u32>().ok())
                    .map(|secs| secs * 1000)
                    .unwrap_or(defaults.paging.notifications_poll_ms),
            },
            feedback_policy: option_env!("FEEDBACK_POLICY")
                .and_then(FeedbackPolicy::parse)
                .unwrap_or(defaults.feedback_policy),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Verifica si el modo de logging está habilitado
    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }

    /// Timeout de red en milisegundos
    pub fn network_timeout_ms(&self) -> u32 {
        self.network_timeout_seconds.saturating_mul(1000)
    }
}

fn minutes_env(value: Option<&str>) -> Option<i64> {
    value
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|m| *m > 0)
        .map(|m| m * 60 * 1000)
}

// Configuración global estática (inmutable). Los componentes la reciben por constructor.
lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}
