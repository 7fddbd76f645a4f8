// ============================================================================
// PAGINACIÓN + SOBRE DEL API GATEWAY
// ============================================================================
// Las Lambdas detrás del API Gateway a veces devuelven `{ "body": "<json>" }`.
// Se desenvuelve UNA vez aquí; el resto del código solo ve tipos.
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Metadatos de paginación tal como los reporta el servidor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginationMeta {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default, alias = "total_images", alias = "total_items", alias = "total_flights")]
    pub total: usize,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub has_previous_page: bool,
}

/// Una página ya tipada, lista para el caché
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: false,
        }
    }
}

/// Quita el sobre `{ body: ... }` si existe
pub fn unwrap_envelope(raw: &str) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ApiError::MalformedResponse(format!("JSON inválido: {}", e)))?;

    match value.get("body") {
        Some(Value::String(inner)) => serde_json::from_str(inner)
            .map_err(|e| ApiError::MalformedResponse(format!("body inválido: {}", e))),
        Some(inner @ Value::Object(_)) | Some(inner @ Value::Array(_)) => Ok(inner.clone()),
        _ => Ok(value),
    }
}

/// Decodifica la respuesta completa a un tipo fuerte o falla sin aplicar nada
pub fn decode_payload<T: DeserializeOwned>(raw: &str) -> Result<T, ApiError> {
    let value = unwrap_envelope(raw)?;
    serde_json::from_value(value)
        .map_err(|e| ApiError::MalformedResponse(format!("Formato de respuesta inválido: {}", e)))
}
