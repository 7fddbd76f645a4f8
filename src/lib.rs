// ============================================================================
// FRENLIUS WEB - NÚCLEO CLIENTE MVVM (RUST + WASM)
// ============================================================================
// - ViewModels: Estado + lógica de cada pantalla
// - Services: Comunicación API, reloj de sesión, caché paginado
// - State: Estado observable + raíz de composición
// - Models: Estructuras compartidas con el backend
// La presentación vive en JS; `app` expone las operaciones vía wasm-bindgen.
// ============================================================================

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod viewmodels;

#[cfg(target_arch = "wasm32")]
mod app;

#[cfg(test)]
mod testing;

pub use config::{AppConfig, CONFIG};
pub use error::ApiError;
pub use state::{AppState, Platform};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // Inicializar panic hook para mejor debugging
    console_error_panic_hook::set_once();

    if CONFIG.is_logging_enabled() {
        let level = if CONFIG.is_production() {
            log::Level::Info
        } else {
            log::Level::Debug
        };
        wasm_logger::init(wasm_logger::Config::new(level));
    }
    log::info!("🚀 Frenlius Web - Rust + WASM ({})", CONFIG.environment);

    app::install(AppState::new(CONFIG.clone(), Platform::browser()));
    Ok(())
}
