//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use mesa_core::catalog::MenuCatalog;
use mesa_core::store::ClientStores;

use crate::broadcast::Hub;
use crate::config::ServerConfig;
use crate::services::realtime::RealtimeClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The client stores sit behind a single
/// mutex so each request updates cart, status and prefill for one client
/// in one critical section; the catalog has its own lock because it is
/// read-mostly and replaced wholesale.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    catalog: RwLock<MenuCatalog>,
    stores: Mutex<ClientStores>,
    hub: Hub,
    realtime: RealtimeClient,
}

impl AppState {
    /// Create a new application state around an initial catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the realtime HTTP client cannot be built.
    pub fn new(config: ServerConfig, catalog: MenuCatalog) -> Result<Self, reqwest::Error> {
        let realtime = RealtimeClient::new(&config)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog: RwLock::new(catalog),
                stores: Mutex::new(ClientStores::default()),
                hub: Hub::new(),
                realtime,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the menu catalog lock.
    #[must_use]
    pub fn catalog(&self) -> &RwLock<MenuCatalog> {
        &self.inner.catalog
    }

    /// Get the per-client store lock.
    #[must_use]
    pub fn stores(&self) -> &Mutex<ClientStores> {
        &self.inner.stores
    }

    /// Get a reference to the push hub.
    #[must_use]
    pub fn hub(&self) -> &Hub {
        &self.inner.hub
    }

    /// Get a reference to the realtime session client.
    #[must_use]
    pub fn realtime(&self) -> &RealtimeClient {
        &self.inner.realtime
    }
}
