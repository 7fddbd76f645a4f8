// Dobles de prueba compartidos por los tests del crate

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::{self, LocalBoxFuture};
use futures::task::LocalSpawnExt;

use crate::error::ApiError;
use crate::models::pagination::Page;
use crate::services::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::services::page_cache::PageSource;
use crate::services::scheduler::{Scheduler, TaskHandle};
use crate::services::token::IdentityProvider;
use crate::utils::time::Clock;

/// Se queda Pending una vez y despierta de inmediato
pub(crate) struct YieldNow {
    yielded: bool,
}

impl YieldNow {
    pub(crate) fn new() -> Self {
        Self { yielded: false }
    }
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

pub(crate) struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub(crate) fn new(now: i64) -> Self {
        Self { now: Cell::new(now) }
    }

    pub(crate) fn advance(&self, ms: i64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

struct ScheduledTask {
    interval_ms: u32,
    active: Rc<Cell<bool>>,
    callback: RefCell<Box<dyn FnMut()>>,
}

/// Intervalos disparados a mano + LocalPool para las tareas async
pub(crate) struct ManualScheduler {
    tasks: RefCell<Vec<Rc<ScheduledTask>>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl ManualScheduler {
    pub(crate) fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            tasks: RefCell::new(Vec::new()),
            pool: RefCell::new(pool),
            spawner,
        }
    }

    /// Una vuelta de cada intervalo activo, luego deja correr lo lanzado
    pub(crate) fn fire_intervals(&self) {
        self.tasks.borrow_mut().retain(|task| task.active.get());
        let snapshot: Vec<Rc<ScheduledTask>> = self.tasks.borrow().clone();
        for task in snapshot {
            if task.active.get() {
                (&mut *task.callback.borrow_mut())();
            }
        }
        self.run_until_stalled();
    }

    pub(crate) fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    pub(crate) fn active_intervals(&self) -> usize {
        self.tasks.borrow().iter().filter(|task| task.active.get()).count()
    }

    pub(crate) fn intervals_ms(&self) -> Vec<u32> {
        self.tasks
            .borrow()
            .iter()
            .filter(|task| task.active.get())
            .map(|task| task.interval_ms)
            .collect()
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, interval_ms: u32, task: Box<dyn FnMut()>) -> TaskHandle {
        let active = Rc::new(Cell::new(true));
        self.tasks.borrow_mut().push(Rc::new(ScheduledTask {
            interval_ms,
            active: active.clone(),
            callback: RefCell::new(task),
        }));
        TaskHandle::new(move || active.set(false))
    }

    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        if let Err(e) = self.spawner.spawn_local(future) {
            panic!("no se pudo lanzar la tarea: {:?}", e);
        }
    }
}

enum Scripted {
    Respond(HttpResponse),
    /// Cede el turno una vez antes de responder
    Deferred(HttpResponse),
    Fail(ApiError),
    Hang,
}

/// Respuestas en orden FIFO; registra peticiones y esperas
#[derive(Default)]
pub(crate) struct MockTransport {
    script: RefCell<VecDeque<Scripted>>,
    requests: RefCell<Vec<HttpRequest>>,
    sleeps: RefCell<Vec<u32>>,
    timers_paused: Cell<bool>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, status: u16, body: &str) {
        self.script
            .borrow_mut()
            .push_back(Scripted::Respond(HttpResponse::new(status, body)));
    }

    pub(crate) fn respond_deferred(&self, status: u16, body: &str) {
        self.script
            .borrow_mut()
            .push_back(Scripted::Deferred(HttpResponse::new(status, body)));
    }

    /// Las esperas quedan pendientes: ninguna petición vence por timeout
    pub(crate) fn pause_timers(&self) {
        self.timers_paused.set(true);
    }

    pub(crate) fn fail(&self, error: ApiError) {
        self.script.borrow_mut().push_back(Scripted::Fail(error));
    }

    pub(crate) fn hang(&self) {
        self.script.borrow_mut().push_back(Scripted::Hang);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|r| r.url.clone()).collect()
    }

    pub(crate) fn sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }
}

impl HttpTransport for MockTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, ApiError>> {
        self.requests.borrow_mut().push(request);
        match self.script.borrow_mut().pop_front() {
            Some(Scripted::Respond(response)) => Box::pin(future::ready(Ok(response))),
            Some(Scripted::Deferred(response)) => Box::pin(async move {
                YieldNow::new().await;
                Ok(response)
            }),
            Some(Scripted::Fail(error)) => Box::pin(future::ready(Err(error))),
            Some(Scripted::Hang) => Box::pin(future::pending()),
            None => Box::pin(future::ready(Err(ApiError::Network("sin respuesta programada".into())))),
        }
    }

    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        self.sleeps.borrow_mut().push(ms);
        if self.timers_paused.get() {
            return Box::pin(future::pending());
        }
        Box::pin(future::ready(()))
    }
}

pub(crate) struct StaticIdentity {
    token: Option<String>,
}

impl StaticIdentity {
    pub(crate) fn new(token: Option<&str>) -> Self {
        Self {
            token: token.map(str::to_string),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn fresh_token(&self) -> LocalBoxFuture<'static, Option<String>> {
        Box::pin(future::ready(self.token.clone()))
    }
}

/// Fuente de páginas en memoria. Cada respuesta cede el turno una vez.
pub(crate) struct ScriptedSource<T> {
    data: RefCell<HashMap<String, Vec<T>>>,
    failures: RefCell<HashMap<(String, u32), ApiError>>,
    calls: RefCell<Vec<(String, u32)>>,
}

impl<T: Clone + 'static> ScriptedSource<T> {
    pub(crate) fn new() -> Self {
        Self {
            data: RefCell::new(HashMap::new()),
            failures: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn insert(&self, key: &str, items: Vec<T>) {
        self.data.borrow_mut().insert(key.to_string(), items);
    }

    pub(crate) fn fail_page(&self, key: &str, page: u32, error: ApiError) {
        self.failures.borrow_mut().insert((key.to_string(), page), error);
    }

    pub(crate) fn clear_failures(&self) {
        self.failures.borrow_mut().clear();
    }

    pub(crate) fn calls(&self) -> Vec<(String, u32)> {
        self.calls.borrow().clone()
    }
}

impl ScriptedSource<u32> {
    /// `count` enteros 0..count bajo `key`
    pub(crate) fn with_items(key: &str, count: u32) -> Self {
        let source = Self::new();
        source.insert(key, (0..count).collect());
        source
    }

    pub(crate) fn add_key(&self, key: &str, count: u32, first: u32) {
        self.insert(key, (first..first + count).collect());
    }
}

impl<T: Clone + 'static> PageSource<T> for ScriptedSource<T> {
    fn fetch_page(&self, key: &str, page: u32, limit: u32) -> LocalBoxFuture<'static, Result<Page<T>, ApiError>> {
        self.calls.borrow_mut().push((key.to_string(), page));

        let result = match self.failures.borrow().get(&(key.to_string(), page)) {
            Some(error) => Err(error.clone()),
            None => match self.data.borrow().get(key) {
                Some(items) => {
                    let start = ((page - 1) * limit) as usize;
                    let end = (start + limit as usize).min(items.len());
                    Ok(Page {
                        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
                        total: items.len(),
                        has_more: end < items.len(),
                    })
                }
                None => Err(ApiError::NotFound),
            },
        };

        Box::pin(async move {
            YieldNow::new().await;
            result
        })
    }
}
