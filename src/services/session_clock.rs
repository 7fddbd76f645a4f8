// ============================================================================
// SESSION CLOCK - Vida de la sesión en el cliente (informativa)
// ============================================================================
// El instante de inicio vive en sessionStorage: sobrevive a recargas de la
// pestaña y desaparece al cerrarla. El servidor sigue siendo quien valida.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::config::SessionConfig;
use crate::services::scheduler::{Scheduler, TaskHandle};
use crate::utils::constants::SESSION_START_KEY;
use crate::utils::format::format_remaining;
use crate::utils::storage::{load_json, save_json, KeyValueStore};
use crate::utils::time::Clock;

/// Lo que el cliente HTTP necesita saber de la sesión local
pub trait SessionGate {
    fn is_active(&self) -> bool;
    /// La credencial fue rechazada por el servidor
    fn expire(&self);
}

type RemainingCallback = Rc<dyn Fn(i64)>;
type ExpireCallback = Rc<dyn Fn()>;

struct Shared {
    config: SessionConfig,
    clock: Rc<dyn Clock>,
    store: Rc<dyn KeyValueStore>,
    scheduler: Rc<dyn Scheduler>,
    warned: Cell<bool>,
    ticker: RefCell<Option<TaskHandle>>,
    on_tick: RefCell<Option<RemainingCallback>>,
    on_warning: RefCell<Option<RemainingCallback>>,
    on_expire: RefCell<Option<ExpireCallback>>,
}

/// Una por aplicación. Los clones comparten estado.
#[derive(Clone)]
pub struct SessionClock {
    shared: Rc<Shared>,
}

impl SessionClock {
    pub fn new(
        config: SessionConfig,
        clock: Rc<dyn Clock>,
        store: Rc<dyn KeyValueStore>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            shared: Rc::new(Shared {
                config,
                clock,
                store,
                scheduler,
                warned: Cell::new(false),
                ticker: RefCell::new(None),
                on_tick: RefCell::new(None),
                on_warning: RefCell::new(None),
                on_expire: RefCell::new(None),
            }),
        }
    }

    /// Cada tick con sesión viva; recibe el tiempo restante en ms
    pub fn on_tick(&self, callback: impl Fn(i64) + 'static) {
        *self.shared.on_tick.borrow_mut() = Some(Rc::new(callback));
    }

    /// Recibe el tiempo restante en ms
    pub fn on_warning(&self, callback: impl Fn(i64) + 'static) {
        *self.shared.on_warning.borrow_mut() = Some(Rc::new(callback));
    }

    pub fn on_expire(&self, callback: impl Fn() + 'static) {
        *self.shared.on_expire.borrow_mut() = Some(Rc::new(callback));
    }

    /// Inicia (o reinicia) la sesión en este instante
    pub fn start(&self) {
        let now = self.shared.clock.now_ms();
        if let Err(e) = save_json(self.shared.store.as_ref(), SESSION_START_KEY, &now) {
            log::error!("❌ Error guardando inicio de sesión: {}", e);
        }
        self.shared.warned.set(false);
        self.arm_ticker();
        log::info!("⏱️ Sesión iniciada ({} restantes)", self.remaining_formatted());
    }

    pub fn extend(&self) {
        log::info!("🔄 Sesión extendida");
        self.start();
    }

    /// Fin voluntario (logout): nunca dispara la expiración
    pub fn end(&self) {
        self.stop_ticker();
        self.clear_start();
        self.shared.warned.set(false);
        log::info!("👋 Sesión finalizada");
    }

    /// Recarga dentro de la misma pestaña: retoma la sesión guardada
    pub fn resume(&self) -> bool {
        if self.start_instant().is_none() {
            if self.shared.store.get_item(SESSION_START_KEY).is_some() {
                log::warn!("⚠️ Inicio de sesión corrupto en storage, se descarta");
                self.clear_start();
            }
            return false;
        }

        log::info!("🔁 Sesión retomada ({} restantes)", self.remaining_formatted());
        self.arm_ticker();
        self.tick();
        true
    }

    /// Recalcula el tiempo restante y dispara aviso/expiración
    pub fn tick(&self) {
        let Some(remaining) = self.remaining() else {
            return;
        };

        if remaining <= 0 {
            self.fire_expiry();
            return;
        }

        let callback = self.shared.on_tick.borrow().clone();
        if let Some(callback) = callback {
            callback(remaining);
        }

        if remaining <= self.shared.config.warning_ms && !self.shared.warned.get() {
            self.shared.warned.set(true);
            log::warn!("⚠️ La sesión expira en {}", format_remaining(remaining));
            let callback = self.shared.on_warning.borrow().clone();
            if let Some(callback) = callback {
                callback(remaining);
            }
        }
    }

    /// Expiración forzada (401/403). Idempotente.
    pub fn expire_now(&self) {
        if self.start_instant().is_some() {
            self.fire_expiry();
        }
    }

    /// None si no hay sesión
    pub fn remaining(&self) -> Option<i64> {
        let start = self.start_instant()?;
        let elapsed = self.shared.clock.now_ms() - start;
        Some(self.shared.config.duration_ms - elapsed)
    }

    pub fn remaining_formatted(&self) -> String {
        format_remaining(self.remaining().unwrap_or(0))
    }

    pub fn is_active(&self) -> bool {
        self.remaining().map_or(false, |remaining| remaining > 0)
    }

    /// Sin inicio guardado también cuenta como expirada
    pub fn is_expired(&self) -> bool {
        !self.is_active()
    }

    pub fn is_near_expiry(&self) -> bool {
        matches!(self.remaining(), Some(r) if r > 0 && r <= self.shared.config.warning_ms)
    }

    pub fn is_ticking(&self) -> bool {
        self.shared.ticker.borrow().is_some()
    }

    fn start_instant(&self) -> Option<i64> {
        load_json::<i64>(self.shared.store.as_ref(), SESSION_START_KEY)
    }

    fn clear_start(&self) {
        if let Err(e) = self.shared.store.remove_item(SESSION_START_KEY) {
            log::error!("❌ Error limpiando inicio de sesión: {}", e);
        }
    }

    fn fire_expiry(&self) {
        self.stop_ticker();
        self.clear_start();
        self.shared.warned.set(false);
        log::warn!("⏰ Sesión expirada");

        let callback = self.shared.on_expire.borrow().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn arm_ticker(&self) {
        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        let handle = self.shared.scheduler.every(
            self.shared.config.check_interval_ms,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    SessionClock { shared }.tick();
                }
            }),
        );
        // el handle anterior se suelta fuera del borrow
        let previous = self.shared.ticker.borrow_mut().replace(handle);
        drop(previous);
    }

    fn stop_ticker(&self) {
        let previous = self.shared.ticker.borrow_mut().take();
        drop(previous);
    }
}

impl SessionGate for SessionClock {
    fn is_active(&self) -> bool {
        SessionClock::is_active(self)
    }

    fn expire(&self) {
        self.expire_now();
    }
}
