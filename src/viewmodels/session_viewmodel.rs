// ============================================================================
// SESSION VIEWMODEL - Estado de sesión para la barra y el modal de expiración
// ============================================================================

use serde::Serialize;

use crate::services::{SessionClock, TokenHolder};
use crate::state::ReactiveState;
use crate::utils::format::format_remaining;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStatus {
    pub active: bool,
    /// "7h 59m"
    pub remaining_label: String,
    /// Aviso previo a la expiración (modal "extender sesión")
    pub warning: Option<String>,
    pub expired_message: Option<String>,
}

#[derive(Clone)]
pub struct SessionViewModel {
    clock: SessionClock,
    tokens: TokenHolder,
    status: ReactiveState<SessionStatus>,
}

impl SessionViewModel {
    pub fn new(clock: SessionClock, tokens: TokenHolder) -> Self {
        let status = ReactiveState::new(SessionStatus::default());

        let on_tick = status.clone();
        clock.on_tick(move |remaining| {
            on_tick.update(|s| s.remaining_label = format_remaining(remaining));
        });

        let on_warning = status.clone();
        clock.on_warning(move |remaining| {
            on_warning.update(|s| {
                s.remaining_label = format_remaining(remaining);
                s.warning = Some(format!(
                    "Tu sesión expirará en {}. ¿Deseas extenderla?",
                    format_remaining(remaining)
                ));
            });
        });

        let on_expire = status.clone();
        let expired_tokens = tokens.clone();
        clock.on_expire(move || {
            expired_tokens.clear();
            on_expire.set(SessionStatus {
                active: false,
                remaining_label: format_remaining(0),
                warning: None,
                expired_message: Some("Sesión expirada. Por favor, inicia sesión nuevamente.".to_string()),
            });
        });

        Self { clock, tokens, status }
    }

    pub fn status(&self) -> ReactiveState<SessionStatus> {
        self.status.clone()
    }

    /// Montaje de la app: retoma la sesión de la pestaña si existe
    pub fn mount(&self) -> bool {
        let resumed = self.tokens.get().is_some() && self.clock.resume();
        if !resumed && self.clock.remaining().is_some() {
            // inicio sin token: no hay sesión que retomar
            self.clock.end();
        }
        self.refresh();
        resumed
    }

    /// El proveedor de identidad confirmó el login
    pub fn login_completed(&self, token: &str) {
        self.tokens.set(token);
        self.clock.start();
        self.status.set(SessionStatus {
            active: true,
            remaining_label: self.clock.remaining_formatted(),
            warning: None,
            expired_message: None,
        });
    }

    pub fn extend(&self) {
        self.clock.extend();
        self.status.update(|s| s.warning = None);
        self.refresh();
    }

    pub fn logout(&self) {
        self.clock.end();
        self.tokens.clear();
        self.status.set(SessionStatus::default());
    }

    pub fn dismiss_expired(&self) {
        self.status.update(|s| s.expired_message = None);
    }

    /// Recalcula la etiqueta de tiempo restante
    pub fn refresh(&self) {
        let active = self.clock.is_active();
        let label = self.clock.remaining_formatted();
        self.status.update(|s| {
            s.active = active;
            s.remaining_label = label;
        });
    }

    pub fn is_active(&self) -> bool {
        self.clock.is_active()
    }
}
