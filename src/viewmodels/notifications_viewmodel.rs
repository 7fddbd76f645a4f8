// ============================================================================
// NOTIFICATIONS VIEWMODEL - Campana, dropdown y página de notificaciones
// ============================================================================
// Carga inicial + "cargar más" por cursor + sondeo periódico de nuevas.
// La última notificación conocida se guarda en localStorage.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::config::PagingConfig;
use crate::error::ApiError;
use crate::models::notification::{
    FeedbackPolicy, FeedbackStep, Notification, NotificationQuery, NotificationStats, NotificationStatus,
};
use crate::services::{NotificationService, Scheduler, TaskHandle};
use crate::state::ReactiveState;
use crate::utils::constants::{LAST_NOTIFICATION_ID_KEY, NOTIFICATIONS_LAST_CHECK_KEY};
use crate::utils::format::format_relative_date;
use crate::utils::storage::KeyValueStore;
use crate::utils::time::Clock;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationsView {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub has_more: bool,
    pub next_key: Option<String>,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
    /// Aviso "N nuevas notificaciones" del último sondeo
    pub new_count: usize,
    pub last_check: Option<String>,
}

impl NotificationsView {
    fn recount(&mut self) {
        self.unread_count = self.notifications.iter().filter(|n| n.is_unread()).count();
    }
}

/// "1 nueva notificación" / "3 nuevas notificaciones"
pub fn new_notifications_label(count: usize) -> String {
    if count == 1 {
        "1 nueva notificación".to_string()
    } else {
        format!("{} nuevas notificaciones", count)
    }
}

pub struct NotificationsViewModel {
    service: NotificationService,
    local_store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    scheduler: Rc<dyn Scheduler>,
    paging: PagingConfig,
    policy: FeedbackPolicy,
    view: ReactiveState<NotificationsView>,
    polling: RefCell<Option<TaskHandle>>,
    checking: Cell<bool>,
    /// Cada load() invalida los "cargar más" en curso
    generation: Cell<u64>,
}

impl NotificationsViewModel {
    pub fn new(
        service: NotificationService,
        local_store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
        scheduler: Rc<dyn Scheduler>,
        paging: PagingConfig,
        policy: FeedbackPolicy,
    ) -> Self {
        let last_check = local_store.get_item(NOTIFICATIONS_LAST_CHECK_KEY);
        Self {
            service,
            local_store,
            clock,
            scheduler,
            paging,
            policy,
            view: ReactiveState::new(NotificationsView {
                last_check,
                ..Default::default()
            }),
            polling: RefCell::new(None),
            checking: Cell::new(false),
            generation: Cell::new(0),
        }
    }

    pub fn view(&self) -> ReactiveState<NotificationsView> {
        self.view.clone()
    }

    pub fn policy(&self) -> FeedbackPolicy {
        self.policy
    }

    /// Carga inicial (reemplaza la lista)
    pub async fn load(&self) -> Result<(), ApiError> {
        self.generation.set(self.generation.get() + 1);
        self.view.update(|v| {
            v.loading = true;
            v.loading_more = false;
            v.error = None;
        });

        let query = NotificationQuery {
            limit: Some(self.paging.notifications_page_size),
            ..Default::default()
        };
        match self.service.get_notifications(&query).await {
            Ok(response) => {
                if let Some(newest) = response.notifications.first() {
                    self.remember_last_id(&newest.notification_id);
                }
                log::info!("🔔 {} notificaciones cargadas", response.notifications.len());
                self.view.update(|v| {
                    v.notifications = response.notifications;
                    v.has_more = response.has_more;
                    v.next_key = response.next_key;
                    v.loading = false;
                    v.recount();
                });
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Siguiente página por cursor. Sin duplicados, al final de la lista.
    pub async fn load_more(&self) -> Result<(), ApiError> {
        let cursor = self.view.with(|v| {
            if v.loading_more || !v.has_more {
                None
            } else {
                v.next_key.clone()
            }
        });
        let Some(cursor) = cursor else {
            return Ok(());
        };

        self.view.update(|v| v.loading_more = true);
        let generation = self.generation.get();
        let query = NotificationQuery {
            limit: Some(self.paging.notifications_page_size),
            last_key: Some(cursor),
            status: None,
        };

        let result = self.service.get_notifications(&query).await;
        if self.generation.get() != generation {
            log::debug!("🗑️ Página de notificaciones descartada (lista recargada)");
            return Ok(());
        }

        match result {
            Ok(response) => {
                self.view.update(|v| {
                    let known: HashSet<String> = v.notifications.iter().map(|n| n.notification_id.clone()).collect();
                    let fresh: Vec<Notification> = response
                        .notifications
                        .into_iter()
                        .filter(|n| !known.contains(&n.notification_id))
                        .collect();
                    log::info!("📥 {} notificaciones más", fresh.len());
                    v.notifications.extend(fresh);
                    v.has_more = response.has_more;
                    v.next_key = response.next_key;
                    v.loading_more = false;
                    v.recount();
                });
                Ok(())
            }
            Err(e) => {
                self.view.update(|v| {
                    v.loading_more = false;
                    v.error = Some(e.user_message());
                });
                Err(e)
            }
        }
    }

    /// Sondeo: devuelve cuántas nuevas hay
    pub async fn check_for_new(&self) -> usize {
        if self.checking.replace(true) {
            return 0;
        }

        let last_known = self.local_store.get_item(LAST_NOTIFICATION_ID_KEY);
        let check = self
            .service
            .check_for_new(last_known.as_deref(), self.paging.notifications_check_limit)
            .await;
        self.checking.set(false);

        let now = self.now_iso();
        if let Err(e) = self.local_store.set_item(NOTIFICATIONS_LAST_CHECK_KEY, &now) {
            log::warn!("⚠️ {}", e);
        }

        if !check.has_new {
            self.view.update(|v| v.last_check = Some(now));
            return 0;
        }

        log::info!("🔔 {}", new_notifications_label(check.new_count));
        if let Some(newest) = check.notifications.first() {
            self.remember_last_id(&newest.notification_id);
        }

        let new_count = check.new_count;
        self.view.update(|v| {
            let known: HashSet<String> = v.notifications.iter().map(|n| n.notification_id.clone()).collect();
            let mut merged: Vec<Notification> = check
                .notifications
                .into_iter()
                .filter(|n| !known.contains(&n.notification_id))
                .collect();
            merged.append(&mut v.notifications);
            v.notifications = merged;
            v.new_count = new_count;
            v.last_check = Some(now);
            v.recount();
        });
        new_count
    }

    /// Sondeo periódico; reemplaza uno anterior
    pub fn start_polling(self: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(self);
        let handle = self.scheduler.every(
            self.paging.notifications_poll_ms,
            Box::new(move || {
                let Some(vm) = weak.upgrade() else {
                    return;
                };
                log::debug!("🔄 Comprobando notificaciones nuevas...");
                let scheduler = vm.scheduler.clone();
                scheduler.spawn(Box::pin(async move {
                    vm.check_for_new().await;
                }));
            }),
        );
        let previous = self.polling.borrow_mut().replace(handle);
        drop(previous);
    }

    pub fn stop_polling(&self) {
        let previous = self.polling.borrow_mut().take();
        drop(previous);
    }

    pub fn is_polling(&self) -> bool {
        self.polling.borrow().is_some()
    }

    pub fn acknowledge_new(&self) {
        self.view.update(|v| v.new_count = 0);
    }

    pub async fn mark_as_read(&self, notification_id: &str) -> Result<(), ApiError> {
        let updated = self.service.mark_as_read(notification_id).await.map_err(|e| {
            self.view.update(|v| v.error = Some(e.user_message()));
            e
        })?;
        let read_at = updated.read_at.or_else(|| Some(self.now_iso()));
        self.view.update(|v| {
            for n in v.notifications.iter_mut().filter(|n| n.notification_id == notification_id) {
                n.status = NotificationStatus::Read;
                n.read_at = read_at.clone();
            }
            v.recount();
        });
        Ok(())
    }

    /// Marca todas las no leídas en paralelo; devuelve cuántas se marcaron
    pub async fn mark_all_as_read(&self) -> usize {
        let unread: Vec<String> = self.view.with(|v| {
            v.notifications
                .iter()
                .filter(|n| n.is_unread())
                .map(|n| n.notification_id.clone())
                .collect()
        });
        if unread.is_empty() {
            return 0;
        }

        let results = self.service.mark_multiple_as_read(&unread).await;
        let marked: HashSet<&String> = unread
            .iter()
            .zip(results.iter())
            .filter(|(_, result)| result.is_ok())
            .map(|(id, _)| id)
            .collect();
        let failures = unread.len() - marked.len();
        if failures > 0 {
            log::warn!("⚠️ {} notificaciones no se pudieron marcar como leídas", failures);
        }

        let now = self.now_iso();
        self.view.update(|v| {
            for n in v.notifications.iter_mut().filter(|n| marked.contains(&n.notification_id)) {
                n.status = NotificationStatus::Read;
                n.read_at = Some(now.clone());
            }
            v.recount();
        });
        marked.len()
    }

    /// Primer paso del modal: según la política se envía ya o se piden comentarios
    pub async fn rate(&self, notification_id: &str, is_useful: bool) -> Result<FeedbackStep, ApiError> {
        let step = self.policy.step_after_rating(is_useful);
        if step == FeedbackStep::Submit {
            self.submit_feedback(notification_id, is_useful, "").await?;
        }
        Ok(step)
    }

    pub async fn submit_feedback(&self, notification_id: &str, is_useful: bool, comments: &str) -> Result<(), ApiError> {
        match self.service.add_feedback(notification_id, is_useful, comments).await {
            Ok(updated) => {
                self.view.update(|v| {
                    if let Some(slot) = v.notifications.iter_mut().find(|n| n.notification_id == notification_id) {
                        *slot = updated;
                    }
                    v.recount();
                });
                Ok(())
            }
            Err(e) => {
                self.view.update(|v| v.error = Some(e.user_message()));
                Err(e)
            }
        }
    }

    pub async fn stats(&self) -> Result<NotificationStats, ApiError> {
        self.service.get_stats().await
    }

    pub async fn image_url(&self, notification_id: &str) -> Result<String, ApiError> {
        self.service.get_image_url(notification_id).await
    }

    /// Etiqueta relativa de la fecha de creación
    pub fn relative_date(&self, notification: &Notification) -> String {
        let now = Utc
            .timestamp_millis_opt(self.clock.now_ms())
            .single()
            .unwrap_or_else(Utc::now);
        format_relative_date(&notification.created_at, now)
    }

    fn remember_last_id(&self, id: &str) {
        if let Err(e) = self.local_store.set_item(LAST_NOTIFICATION_ID_KEY, id) {
            log::warn!("⚠️ {}", e);
        }
    }

    fn fail(&self, error: &ApiError) {
        log::error!("❌ Error cargando notificaciones: {}", error);
        self.view.update(|v| {
            v.loading = false;
            v.error = Some(error.user_message());
        });
    }

    fn now_iso(&self) -> String {
        Utc.timestamp_millis_opt(self.clock.now_ms())
            .single()
            .map(|now| now.to_rfc3339())
            .unwrap_or_default()
    }
}

impl Drop for NotificationsViewModel {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
