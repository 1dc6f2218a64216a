// Application state (AppState)

use crate::core::config::Config;
use crate::metrics::collector::Metrics;
use crate::notify::notifier::Notifier;
use crate::services::access::AccessService;
use crate::services::registration::RegistrationService;
use crate::services::serial_id::SerialIdAllocator;
use crate::stores::user_store::UserStore;
use std::sync::Arc;

/// Shared application state
///
/// Everything request handlers touch, wired around a single user store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<UserStore>,

    pub registration: Arc<RegistrationService>,

    pub access: Arc<AccessService>,

    pub metrics: Arc<Metrics>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: UserStore, notifier: Notifier) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(store);
        let notifier = Arc::new(notifier);
        let capacity = config.registry.max_serial_id;

        let allocator = SerialIdAllocator::new(capacity, Arc::clone(&notifier));
        let registration = Arc::new(RegistrationService::new(
            Arc::clone(&store),
            allocator,
            Arc::clone(&notifier),
        ));
        let access = Arc::new(AccessService::new(Arc::clone(&store), capacity, notifier));

        Self {
            store,
            registration,
            access,
            metrics: Arc::new(Metrics::new()),
            config,
        }
    }

    pub fn capacity(&self) -> usize {
        self.config.registry.max_serial_id
    }
}
