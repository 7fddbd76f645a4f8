// ============================================================================
// STATE MODULE - State Management con Rc<RefCell> + notificaciones
// ============================================================================

pub mod app_state;
pub mod reactivity;

pub use app_state::*;
pub use reactivity::*;
