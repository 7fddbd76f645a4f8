// ============================================================================
// APP - Operaciones expuestas a la capa de presentación (JS)
// ============================================================================
// Los estados se entregan como JSON; las operaciones async devuelven Promise.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

use crate::error::ApiError;
use crate::models::flight::FlightFilter;
use crate::models::notification::FeedbackStep;
use crate::services::UploadFile;
use crate::state::AppState;

// Instancia única, creada en main()
thread_local! {
    static APP: RefCell<Option<Rc<AppState>>> = RefCell::new(None);
}

pub fn install(state: AppState) {
    let state = Rc::new(state);
    APP.with(|cell| *cell.borrow_mut() = Some(state.clone()));

    wasm_bindgen_futures::spawn_local(async move {
        if state.init().await {
            log::info!("✅ Sesión retomada");
        }
    });
}

fn app() -> Result<Rc<AppState>, JsValue> {
    APP.with(|cell| cell.borrow().clone())
        .ok_or_else(|| JsValue::from_str("App no está inicializada"))
}

fn js_error(error: ApiError) -> JsValue {
    JsValue::from_str(&error.user_message())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Error serializando estado: {}", e)))
}

fn parse_day(value: &str) -> Result<Option<NaiveDate>, JsValue> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|_| JsValue::from_str(&format!("Fecha inválida: {}", value)))
}

/// Invoca `callback(json)` en cada cambio
fn forward<T: serde::Serialize + Clone + 'static>(state: &crate::state::ReactiveState<T>, callback: js_sys::Function) {
    state.subscribe(move |value| match serde_json::to_string(value) {
        Ok(json) => {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                log::error!("❌ Error en callback JS: {:?}", e);
            }
        }
        Err(e) => log::error!("❌ Error serializando estado: {}", e),
    });
}

// ============================================================================
// SESIÓN
// ============================================================================

#[wasm_bindgen]
pub async fn login_completed(token: String) -> Result<(), JsValue> {
    app()?.login_completed(&token).await;
    Ok(())
}

#[wasm_bindgen]
pub fn logout() -> Result<(), JsValue> {
    app()?.logout();
    Ok(())
}

#[wasm_bindgen]
pub fn extend_session() -> Result<(), JsValue> {
    app()?.session.extend();
    Ok(())
}

#[wasm_bindgen]
pub fn dismiss_session_expired() -> Result<(), JsValue> {
    app()?.session.dismiss_expired();
    Ok(())
}

#[wasm_bindgen]
pub fn session_status() -> Result<String, JsValue> {
    let app = app()?;
    app.session.refresh();
    to_json(&app.session.status().get())
}

#[wasm_bindgen]
pub fn on_session_change(callback: js_sys::Function) -> Result<(), JsValue> {
    forward(&app()?.session.status(), callback);
    Ok(())
}

// ============================================================================
// RUTAS Y SUBIDAS
// ============================================================================

#[wasm_bindgen]
pub async fn list_routes() -> Result<String, JsValue> {
    let routes = app()?.uploads.list_routes().await.map_err(js_error)?;
    to_json(&routes)
}

/// Devuelve el nombre normalizado por el servidor
#[wasm_bindgen]
pub async fn create_route(name: String) -> Result<String, JsValue> {
    let app = app()?;
    let existing = app.uploads.list_routes().await.map_err(js_error)?;
    let created = app.uploads.create_route(&name, &existing).await.map_err(js_error)?;
    Ok(created.new_route)
}

/// Un archivo por llamada; devuelve true si se subió
#[wasm_bindgen]
pub async fn upload_image(route: String, name: String, content_type: String, bytes: Vec<u8>) -> Result<bool, JsValue> {
    let app = app()?;
    let file = UploadFile {
        name,
        content_type,
        bytes,
    };
    let report = app.uploads.upload_files(&route, vec![file]).await.map_err(js_error)?;
    if let Some((name, error)) = report.failed.first() {
        log::error!("❌ {} no se subió: {}", name, error);
    }
    Ok(report.is_complete())
}

// ============================================================================
// VUELOS
// ============================================================================

#[wasm_bindgen]
pub async fn select_route(route: String) -> Result<(), JsValue> {
    app()?.flights.select_route(&route).await.map_err(js_error)
}

#[wasm_bindgen]
pub async fn load_more_flights() -> Result<(), JsValue> {
    app()?.flights.load_more().await.map_err(js_error)
}

#[wasm_bindgen]
pub async fn refresh_flights() -> Result<(), JsValue> {
    app()?.flights.refresh().await.map_err(js_error)
}

/// Fechas "YYYY-MM-DD"; `to` vacío filtra un solo día
#[wasm_bindgen]
pub async fn filter_flights(from: String, to: String) -> Result<(), JsValue> {
    let filter = match (parse_day(&from)?, parse_day(&to)?) {
        (Some(day), None) => FlightFilter::SingleDay(day),
        (None, None) => FlightFilter::All,
        (from, to) => FlightFilter::Range { from, to },
    };
    app()?.flights.apply_filter(filter).await.map_err(js_error)
}

#[wasm_bindgen]
pub fn clear_flight_filter() -> Result<(), JsValue> {
    app()?.flights.clear_filter();
    Ok(())
}

#[wasm_bindgen]
pub fn flights_view() -> Result<String, JsValue> {
    let view = app()?.flights.view().get();
    to_json(&serde_json::json!({
        "route": view.route,
        "flights": view.visible(),
        "filtered": view.filtered.is_some(),
        "remaining": view.remaining,
        "has_more": view.has_more,
        "loading": view.loading,
        "error": view.error,
    }))
}

// ============================================================================
// GALERÍA
// ============================================================================

#[wasm_bindgen]
pub async fn select_flight(flight: String) -> Result<(), JsValue> {
    app()?.images.select_flight(&flight).await.map_err(js_error)
}

#[wasm_bindgen]
pub async fn load_more_images() -> Result<(), JsValue> {
    app()?.images.load_more().await.map_err(js_error)
}

#[wasm_bindgen]
pub async fn retry_images() -> Result<(), JsValue> {
    app()?.images.retry().await.map_err(js_error)
}

#[wasm_bindgen]
pub fn close_gallery() -> Result<(), JsValue> {
    app()?.images.clear();
    Ok(())
}

#[wasm_bindgen]
pub fn gallery_view() -> Result<String, JsValue> {
    to_json(&app()?.images.view().get())
}

#[wasm_bindgen]
pub fn on_gallery_change(callback: js_sys::Function) -> Result<(), JsValue> {
    forward(&app()?.images.view(), callback);
    Ok(())
}

// ============================================================================
// NOTIFICACIONES
// ============================================================================

#[wasm_bindgen]
pub async fn load_notifications() -> Result<(), JsValue> {
    app()?.notifications.load().await.map_err(js_error)
}

#[wasm_bindgen]
pub async fn load_more_notifications() -> Result<(), JsValue> {
    app()?.notifications.load_more().await.map_err(js_error)
}

#[wasm_bindgen]
pub async fn check_new_notifications() -> Result<usize, JsValue> {
    Ok(app()?.notifications.check_for_new().await)
}

#[wasm_bindgen]
pub fn acknowledge_new_notifications() -> Result<(), JsValue> {
    app()?.notifications.acknowledge_new();
    Ok(())
}

#[wasm_bindgen]
pub async fn mark_notification_read(notification_id: String) -> Result<(), JsValue> {
    app()?.notifications.mark_as_read(&notification_id).await.map_err(js_error)
}

#[wasm_bindgen]
pub async fn mark_all_notifications_read() -> Result<usize, JsValue> {
    Ok(app()?.notifications.mark_all_as_read().await)
}

/// "submitted" o "ask_comments"
#[wasm_bindgen]
pub async fn rate_notification(notification_id: String, is_useful: bool) -> Result<String, JsValue> {
    let step = app()?.notifications.rate(&notification_id, is_useful).await.map_err(js_error)?;
    Ok(match step {
        FeedbackStep::Submit => "submitted".to_string(),
        FeedbackStep::AskComments => "ask_comments".to_string(),
    })
}

#[wasm_bindgen]
pub async fn submit_feedback(notification_id: String, is_useful: bool, comments: String) -> Result<(), JsValue> {
    app()?
        .notifications
        .submit_feedback(&notification_id, is_useful, &comments)
        .await
        .map_err(js_error)
}

#[wasm_bindgen]
pub async fn notification_image_url(notification_id: String) -> Result<String, JsValue> {
    app()?.notifications.image_url(&notification_id).await.map_err(js_error)
}

#[wasm_bindgen]
pub fn notifications_view() -> Result<String, JsValue> {
    to_json(&app()?.notifications.view().get())
}

#[wasm_bindgen]
pub fn on_notifications_change(callback: js_sys::Function) -> Result<(), JsValue> {
    forward(&app()?.notifications.view(), callback);
    Ok(())
}

/// "hace 5 min", "hace 3h"...
#[wasm_bindgen]
pub fn notification_relative_date(created_at: String) -> Result<String, JsValue> {
    let notification = crate::models::notification::Notification {
        created_at,
        ..Default::default()
    };
    Ok(app()?.notifications.relative_date(&notification))
}

#[wasm_bindgen]
pub async fn notification_stats() -> Result<String, JsValue> {
    let stats = app()?.notifications.stats().await.map_err(js_error)?;
    to_json(&stats)
}
