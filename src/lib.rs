pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod handlers {
    pub mod access;
    pub mod admin;
    pub mod fallback;
    pub mod health;
    pub mod metrics;
    pub mod pins;
    pub mod register;

    #[cfg(test)]
    pub(crate) mod test_support;
}

pub mod models {
    pub mod api;
    pub mod user;
}

pub mod notify {
    pub mod notifier;
    pub mod webhook;
}

pub mod services {
    pub mod access;
    pub mod registration;
    pub mod serial_id;
}

pub mod stores {
    pub mod user_store;
}

pub mod metrics {
    pub mod collector;
}

pub mod utils {
    pub mod auth;
    pub mod time;
}

pub mod validation {
    pub mod registration;
}

pub mod wal {
    #[allow(clippy::module_inception)]
    pub mod wal;
}
