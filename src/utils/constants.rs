/// URL base del API Gateway
/// Configurada en tiempo de compilación:
/// - Desarrollo: http://localhost:3000 (por defecto)
/// - Producción: via API_BASE_URL env var
pub const API_BASE_URL: &str = match option_env!("API_BASE_URL") {
    Some(url) => url,
    None => "http://localhost:3000",
};

// Claves de sessionStorage (se pierden al cerrar la pestaña)
pub const SESSION_START_KEY: &str = "sessionStartTime";
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

// Claves de localStorage
pub const LAST_NOTIFICATION_ID_KEY: &str = "lastNotificationId";
pub const NOTIFICATIONS_LAST_CHECK_KEY: &str = "notificationsLastCheck";

/// Tope del backoff exponencial ante 429
pub const MAX_BACKOFF_MS: u32 = 10_000;
