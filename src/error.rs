// ============================================================================
// ERRORES DE API - Clasificación tipada de fallos remotos
// ============================================================================
// Toda respuesta fallida se clasifica UNA vez en la frontera HTTP.
// Los view-models nunca ven códigos de estado crudos.
// ============================================================================

use thiserror::Error;

/// Error clasificado de una llamada a los servicios externos
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401 o sesión local ya expirada
    #[error("no autorizado")]
    Unauthorized,

    /// 403
    #[error("acceso denegado")]
    Forbidden,

    /// 404
    #[error("recurso no encontrado")]
    NotFound,

    /// 429 tras agotar los reintentos
    #[error("demasiadas peticiones (retry-after: {retry_after_secs:?})")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("tiempo de espera agotado ({0} ms)")]
    Timeout(u32),

    #[error("error de red: {0}")]
    Network(String),

    /// Falta el array esperado o el JSON no encaja con el tipo
    #[error("respuesta inválida: {0}")]
    MalformedResponse(String),

    /// Otros 4xx (400, 409...)
    #[error("petición rechazada ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 5xx
    #[error("error del servidor ({status}): {message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    /// Clasificar una respuesta HTTP no exitosa
    pub fn from_status(status: u16, body: &str, retry_after_secs: Option<u64>) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            429 => ApiError::RateLimited { retry_after_secs },
            400..=499 => ApiError::Rejected {
                status,
                message: extract_server_message(body),
            },
            _ => ApiError::Server {
                status,
                message: extract_server_message(body),
            },
        }
    }

    /// 401/403: la credencial ya no sirve, hay que cerrar la sesión local
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    /// El usuario puede reintentar manualmente
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited { .. }
                | ApiError::Timeout(_)
                | ApiError::Network(_)
                | ApiError::Server { .. }
        )
    }

    /// Código HTTP asociado, si lo hay
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::NotFound => Some(404),
            ApiError::RateLimited { .. } => Some(429),
            ApiError::Rejected { status, .. } | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Mensaje corto para mostrar junto al control afectado
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => {
                "Sesión expirada. Por favor, inicia sesión nuevamente.".to_string()
            }
            ApiError::Forbidden => "No tienes permisos para acceder a este recurso.".to_string(),
            ApiError::NotFound => "No se encontraron resultados.".to_string(),
            ApiError::RateLimited { .. } => {
                "Demasiadas peticiones. Inténtalo de nuevo en unos segundos.".to_string()
            }
            ApiError::Timeout(_) | ApiError::Network(_) => {
                "Error de conexión. Verifica tu conexión a internet.".to_string()
            }
            ApiError::MalformedResponse(_) => {
                "Formato de respuesta inválido del servidor.".to_string()
            }
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Server { message, .. } => format!("Error del servidor: {}", message),
        }
    }
}

/// Extrae `message` o `error` del cuerpo JSON; si no hay, un texto genérico
fn extract_server_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|field| {
                value
                    .get(*field)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| "Error desconocido en la comunicación con el servidor".to_string())
}
