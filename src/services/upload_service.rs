// ============================================================================
// RUTAS + SUBIDA DE IMÁGENES
// ============================================================================
// Subida en dos pasos: el API devuelve URLs prefirmadas y cada archivo se
// envía con PUT directo al almacenamiento.
// ============================================================================

use crate::error::ApiError;
use crate::models::route::{
    validate_route_name, CreateRouteRequest, CreateRouteResponse, RoutesResponse, UploadUrlRequest,
    UploadUrlResponse,
};
use crate::services::api_client::ApiClient;

/// Archivo elegido por el usuario, ya leído en memoria
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Resultado por archivo; un fallo no detiene el resto
#[derive(Debug, Default, PartialEq)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub failed: Vec<(String, ApiError)>,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone)]
pub struct UploadService {
    api: ApiClient,
}

impl UploadService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list_routes(&self) -> Result<Vec<String>, ApiError> {
        let response: RoutesResponse = self.api.get_json(&self.api.endpoints().list_routes).await?;
        log::info!("🗺️ {} rutas disponibles", response.routes.len());
        Ok(response.routes)
    }

    /// Valida en cliente y crea la ruta. 409 -> la ruta ya existe.
    pub async fn create_route(&self, name: &str, existing: &[String]) -> Result<CreateRouteResponse, ApiError> {
        let validation = validate_route_name(name, existing);
        if !validation.is_valid {
            return Err(ApiError::Rejected {
                status: 400,
                message: validation.issues.join(". "),
            });
        }

        let request = CreateRouteRequest {
            new_route: name.trim().to_string(),
        };
        match self
            .api
            .post_json::<_, CreateRouteResponse>(&self.api.endpoints().create_route, &request)
            .await
        {
            Ok(created) => {
                log::info!("✅ Ruta creada: {:?}", created);
                Ok(created)
            }
            Err(ApiError::Rejected { status: 409, .. }) => Err(ApiError::Rejected {
                status: 409,
                message: format!("La ruta \"{}\" ya existe", request.new_route),
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn request_upload_urls(&self, route: &str, file_names: &[String]) -> Result<UploadUrlResponse, ApiError> {
        let request = UploadUrlRequest::for_files(route, file_names);
        self.api.post_json(&self.api.endpoints().upload_image, &request).await
    }

    /// Sube los archivos en orden a la ruta indicada
    pub async fn upload_files(&self, route: &str, files: Vec<UploadFile>) -> Result<UploadReport, ApiError> {
        if route.is_empty() || files.is_empty() {
            return Err(ApiError::Rejected {
                status: 400,
                message: "Selecciona una ruta y una carpeta con imágenes.".to_string(),
            });
        }

        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        let urls = self.request_upload_urls(route, &names).await?;
        log::info!("📤 Subiendo {} imágenes a {}", files.len(), route);

        let mut report = UploadReport::default();
        for file in files {
            let Some(url) = urls.url_for(&file.name) else {
                log::error!("❌ Sin URL de subida para {}", file.name);
                report
                    .failed
                    .push((file.name, ApiError::MalformedResponse("URL de subida ausente".into())));
                continue;
            };

            match self.api.put_object(url, &file.content_type, file.bytes).await {
                Ok(()) => report.uploaded.push(file.name),
                Err(e) => {
                    log::error!("❌ Error subiendo {}: {}", file.name, e);
                    report.failed.push((file.name, e));
                }
            }
        }

        log::info!("📤 Subida terminada: {} ok, {} con error", report.uploaded.len(), report.failed.len());
        Ok(report)
    }
}
