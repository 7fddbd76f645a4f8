// ============================================================================
// SERVICES - Comunicación con los servicios externos + utilidades de estado
// ============================================================================

pub mod api_client;
pub mod flight_service;
pub mod http;
pub mod image_service;
pub mod notification_service;
pub mod page_cache;
pub mod scheduler;
pub mod session_clock;
pub mod token;
pub mod upload_service;

pub use api_client::ApiClient;
pub use flight_service::FlightPageSource;
pub use http::{HttpRequest, HttpResponse, HttpTransport};
pub use image_service::ImagePageSource;
pub use notification_service::NotificationService;
pub use page_cache::{PageCache, PageSource};
pub use scheduler::{Scheduler, TaskHandle};
pub use session_clock::{SessionClock, SessionGate};
pub use token::{IdentityProvider, TokenHolder};
pub use upload_service::{UploadFile, UploadReport, UploadService};
