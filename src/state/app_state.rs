// ============================================================================
// APP STATE - Raíz de composición de la aplicación
// ============================================================================
// Construye reloj de sesión, cliente HTTP, cachés y view-models una sola vez
// y los conecta entre sí. Nada aquí es global: quien lo crea lo posee.
// ============================================================================

use std::rc::{Rc, Weak};

use crate::config::AppConfig;
use crate::models::flight::FlightImage;
use crate::services::{
    ApiClient, FlightPageSource, HttpTransport, IdentityProvider, ImagePageSource, NotificationService, PageCache,
    Scheduler, SessionClock, SessionGate, TokenHolder, UploadService,
};
use crate::utils::storage::KeyValueStore;
use crate::utils::time::Clock;
use crate::viewmodels::{FlightsViewModel, ImagesViewModel, NotificationsViewModel, SessionViewModel};

/// Dependencias del entorno (navegador o dobles de prueba)
#[derive(Clone)]
pub struct Platform {
    pub clock: Rc<dyn Clock>,
    /// sessionStorage: inicio de sesión y token
    pub session_store: Rc<dyn KeyValueStore>,
    /// localStorage: última notificación vista
    pub local_store: Rc<dyn KeyValueStore>,
    pub scheduler: Rc<dyn Scheduler>,
    pub transport: Rc<dyn HttpTransport>,
    pub identity: Option<Rc<dyn IdentityProvider>>,
}

#[cfg(target_arch = "wasm32")]
impl Platform {
    pub fn browser() -> Self {
        use crate::services::http::GlooTransport;
        use crate::services::scheduler::GlooScheduler;
        use crate::utils::storage::{BrowserStorage, MemoryStore, StorageArea};
        use crate::utils::time::SystemClock;

        let open = |area: StorageArea| -> Rc<dyn KeyValueStore> {
            match BrowserStorage::open(area) {
                Some(storage) => Rc::new(storage),
                None => {
                    log::warn!("⚠️ {:?} no disponible, usando memoria", area);
                    Rc::new(MemoryStore::new())
                }
            }
        };

        Self {
            clock: Rc::new(SystemClock),
            session_store: open(StorageArea::Session),
            local_store: open(StorageArea::Local),
            scheduler: Rc::new(GlooScheduler::new()),
            transport: Rc::new(GlooTransport::new()),
            identity: None,
        }
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub session_clock: SessionClock,
    pub tokens: TokenHolder,
    pub api: ApiClient,
    pub session: SessionViewModel,
    pub images: ImagesViewModel,
    pub flights: FlightsViewModel,
    pub notifications: Rc<NotificationsViewModel>,
    pub uploads: UploadService,
}

impl AppState {
    pub fn new(config: AppConfig, platform: Platform) -> Self {
        let tokens = TokenHolder::new(platform.session_store.clone());
        let session_clock = SessionClock::new(
            config.session,
            platform.clock.clone(),
            platform.session_store.clone(),
            platform.scheduler.clone(),
        );

        let gate: Rc<dyn SessionGate> = Rc::new(session_clock.clone());
        let mut api = ApiClient::new(platform.transport.clone(), tokens.clone(), &config).with_session_gate(gate);
        if let Some(identity) = platform.identity.clone() {
            api = api.with_identity_provider(identity);
        }

        let session = SessionViewModel::new(session_clock.clone(), tokens.clone());

        let image_cache: Rc<PageCache<FlightImage>> = Rc::new(PageCache::new(
            Rc::new(ImagePageSource::new(api.clone(), platform.clock.clone())),
            config.paging.images_page_size,
        ));
        let expiring = session_clock.clone();
        image_cache.on_auth_failure(move || expiring.expire_now());
        let images = ImagesViewModel::new(image_cache);

        let flights = FlightsViewModel::new(FlightPageSource::new(api.clone()), config.paging.flights_page_size);
        let expiring = session_clock.clone();
        flights.cache().on_auth_failure(move || expiring.expire_now());

        let notifications = Rc::new(NotificationsViewModel::new(
            NotificationService::new(api.clone()),
            platform.local_store.clone(),
            platform.clock.clone(),
            platform.scheduler.clone(),
            config.paging,
            config.feedback_policy,
        ));

        // Sesión expirada: deja de sondear notificaciones
        let polling: Weak<NotificationsViewModel> = Rc::downgrade(&notifications);
        session.status().subscribe(move |status| {
            if status.active {
                return;
            }
            if let Some(vm) = polling.upgrade() {
                if vm.is_polling() {
                    log::info!("🔕 Sondeo de notificaciones detenido (sesión inactiva)");
                    vm.stop_polling();
                }
            }
        });

        let uploads = UploadService::new(api.clone());

        Self {
            config,
            session_clock,
            tokens,
            api,
            session,
            images,
            flights,
            notifications,
            uploads,
        }
    }

    /// Montaje: retoma la sesión de la pestaña y arranca lo que depende de ella
    pub async fn init(&self) -> bool {
        log::info!("🚀 Inicializando ({})", self.config.environment);
        if !self.session.mount() {
            log::info!("🔐 Sin sesión activa, esperando login");
            return false;
        }
        self.start_session_work().await;
        true
    }

    /// Login completado por el proveedor de identidad
    pub async fn login_completed(&self, token: &str) {
        self.session.login_completed(token);
        self.start_session_work().await;
    }

    pub fn logout(&self) {
        self.teardown();
        self.session.logout();
    }

    /// Desmontaje: para temporizadores y vacía cachés
    pub fn teardown(&self) {
        self.notifications.stop_polling();
        self.images.clear();
        self.flights.cache().clear();
        self.session_clock.end();
        log::info!("🧹 Estado de la aplicación liberado");
    }

    async fn start_session_work(&self) {
        if let Err(e) = self.notifications.load().await {
            log::warn!("⚠️ Notificaciones no disponibles: {}", e);
            if e.is_auth_expired() {
                return;
            }
        }
        self.notifications.start_polling();
    }
}
