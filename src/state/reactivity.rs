// ============================================================================
// REACTIVITY - Estado observable para la UI
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Subscriber<T> = Rc<dyn Fn(&T)>;

pub type SubscriptionId = usize;

struct Inner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<(SubscriptionId, Subscriber<T>)>>,
    next_id: Cell<SubscriptionId>,
}

/// Valor compartido que avisa a sus suscriptores en cada cambio.
/// Los clones comparten valor y suscriptores.
pub struct ReactiveState<T> {
    inner: Rc<Inner<T>>,
}

impl<T: Clone + 'static> ReactiveState<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Lee sin clonar
    pub fn with<R>(&self, reader: impl FnOnce(&T) -> R) -> R {
        reader(&self.inner.value.borrow())
    }

    pub fn set(&self, new_value: T) {
        *self.inner.value.borrow_mut() = new_value;
        self.notify();
    }

    pub fn update(&self, updater: impl FnOnce(&mut T)) {
        updater(&mut self.inner.value.borrow_mut());
        self.notify();
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.subscribers.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.subscribers.borrow_mut().retain(|(existing, _)| *existing != id);
    }

    // Copia del valor y de la lista: un suscriptor puede volver a escribir o desuscribirse
    fn notify(&self) {
        let snapshot = self.get();
        let subscribers: Vec<Subscriber<T>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in subscribers {
            callback(&snapshot);
        }
    }
}

impl<T> Clone for ReactiveState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
