use serde::{Deserialize, Serialize};

/// Respuesta de `list-routes`
#[derive(Debug, Clone, Deserialize)]
pub struct RoutesResponse {
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRouteRequest {
    pub new_route: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateRouteResponse {
    pub new_route: String,
    #[serde(default)]
    pub original_input: Option<String>,
    #[serde(default)]
    pub all_routes: Vec<String>,
}

/// Resultado de validar un nombre de ruta en cliente (mismas reglas que el backend)
#[derive(Debug, Clone, PartialEq)]
pub struct RouteNameValidation {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

pub fn validate_route_name(name: &str, existing_routes: &[String]) -> RouteNameValidation {
    let name = name.trim();
    let mut issues = Vec::new();

    let length = name.chars().count();
    if length < 3 {
        issues.push("Debe tener al menos 3 caracteres".to_string());
    }
    if length > 50 {
        issues.push("No puede exceder 50 caracteres".to_string());
    }
    if !name.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
        issues.push("Solo se permiten letras y guiones".to_string());
    }
    if let Some(first) = name.chars().next() {
        if !first.is_ascii_alphabetic() {
            issues.push("Debe empezar con una letra".to_string());
        }
    }
    if name.ends_with('-') {
        issues.push("No puede terminar con guión".to_string());
    }
    if name.contains("--") {
        issues.push("No se permiten guiones consecutivos".to_string());
    }

    let lower = name.to_lowercase();
    if existing_routes.iter().any(|r| r.to_lowercase() == lower) {
        issues.push("Esta ruta ya existe".to_string());
    }

    RouteNameValidation {
        is_valid: issues.is_empty(),
        issues,
    }
}

/// Vista previa del nombre tal como lo normaliza el backend: "costa-norte" -> "Costa-norte"
pub fn format_route_preview(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ============================================================================
// SUBIDA DE IMÁGENES (URLs prefirmadas)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct UploadUrlRequest {
    /// "ruta/a.jpg,ruta/b.jpg"
    pub image_keys: String,
}

impl UploadUrlRequest {
    pub fn for_files(route: &str, file_names: &[String]) -> Self {
        Self {
            image_keys: file_names
                .iter()
                .map(|name| format!("{}/{}", route, name))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadUrl {
    pub image_key: String,
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadUrlResponse {
    pub urls: Vec<UploadUrl>,
}

impl UploadUrlResponse {
    pub fn url_for(&self, file_name: &str) -> Option<&str> {
        let suffix = format!("/{}", file_name);
        self.urls
            .iter()
            .find(|u| u.image_key.ends_with(&suffix))
            .map(|u| u.upload_url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_route_name() {
        let result = validate_route_name("Costa-Norte", &[]);
        assert!(result.is_valid, "{:?}", result.issues);
    }

    #[test]
    fn test_invalid_route_names() {
        let existing = vec!["Costa".to_string()];
        assert!(!validate_route_name("ab", &existing).is_valid);
        assert!(!validate_route_name("ruta-", &existing).is_valid);
        assert!(!validate_route_name("ruta--sur", &existing).is_valid);
        assert!(!validate_route_name("-ruta", &existing).is_valid);
        assert!(!validate_route_name("ruta 1", &existing).is_valid);
        assert!(!validate_route_name(&"a".repeat(51), &existing).is_valid);

        let duplicate = validate_route_name("COSTA", &existing);
        assert!(!duplicate.is_valid);
        assert_eq!(duplicate.issues, vec!["Esta ruta ya existe"]);
    }

    #[test]
    fn test_route_preview() {
        assert_eq!(format_route_preview("costa-NORTE"), "Costa-norte");
        assert_eq!(format_route_preview(""), "");
    }

    #[test]
    fn test_upload_url_matching() {
        let request = UploadUrlRequest::for_files("Costa", &["a.jpg".to_string(), "b.jpg".to_string()]);
        assert_eq!(request.image_keys, "Costa/a.jpg,Costa/b.jpg");

        let response: UploadUrlResponse = serde_json::from_str(
            r#"{"urls":[{"image_key":"Costa/a.jpg","uploadUrl":"https://s3/a"},{"image_key":"Costa/b.jpg","uploadUrl":"https://s3/b"}]}"#,
        )
        .unwrap();
        assert_eq!(response.url_for("b.jpg"), Some("https://s3/b"));
        assert_eq!(response.url_for("c.jpg"), None);
    }
}
