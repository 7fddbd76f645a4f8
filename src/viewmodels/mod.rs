// ============================================================================
// VIEWMODELS - Estado + lógica de cada pantalla
// ============================================================================

pub mod flights_viewmodel;
pub mod images_viewmodel;
pub mod notifications_viewmodel;
pub mod session_viewmodel;

pub use flights_viewmodel::{FlightListView, FlightsViewModel};
pub use images_viewmodel::{GalleryView, ImagesViewModel};
pub use notifications_viewmodel::{new_notifications_label, NotificationsView, NotificationsViewModel};
pub use session_viewmodel::{SessionStatus, SessionViewModel};
