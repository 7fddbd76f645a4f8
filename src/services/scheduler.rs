// ============================================================================
// SCHEDULER - Temporizadores periódicos cancelables + tareas async locales
// ============================================================================

use futures::future::LocalBoxFuture;

pub trait Scheduler {
    /// Ejecuta `task` cada `interval_ms` hasta que se suelte el handle
    fn every(&self, interval_ms: u32, task: Box<dyn FnMut()>) -> TaskHandle;

    /// Lanza trabajo async en el bucle de eventos
    fn spawn(&self, future: LocalBoxFuture<'static, ()>);
}

/// Cancela su tarea al llamar `cancel()` o al soltarse
pub struct TaskHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TaskHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::GlooScheduler;

#[cfg(target_arch = "wasm32")]
mod browser {
    use std::cell::Cell;
    use std::rc::Rc;

    use futures::future::LocalBoxFuture;
    use gloo_timers::callback::{Interval, Timeout};

    use super::{Scheduler, TaskHandle};

    #[derive(Clone, Copy, Default)]
    pub struct GlooScheduler;

    impl GlooScheduler {
        pub fn new() -> Self {
            Self
        }
    }

    impl Scheduler for GlooScheduler {
        fn every(&self, interval_ms: u32, mut task: Box<dyn FnMut()>) -> TaskHandle {
            let active = Rc::new(Cell::new(true));
            let running = active.clone();
            let interval = Interval::new(interval_ms, move || {
                if running.get() {
                    task();
                }
            });

            TaskHandle::new(move || {
                active.set(false);
                // El Interval puede estar ejecutando su propio callback: se suelta en el siguiente turno
                Timeout::new(0, move || drop(interval)).forget();
            })
        }

        fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
            wasm_bindgen_futures::spawn_local(future);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_handle_cancels_once_on_drop_or_cancel() {
        let cancelled = Rc::new(Cell::new(0));

        let counter = cancelled.clone();
        let handle = TaskHandle::new(move || counter.set(counter.get() + 1));
        drop(handle);
        assert_eq!(cancelled.get(), 1);

        let counter = cancelled.clone();
        let handle = TaskHandle::new(move || counter.set(counter.get() + 1));
        handle.cancel();
        assert_eq!(cancelled.get(), 2);
    }
}
