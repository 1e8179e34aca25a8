use once_cell::sync::OnceCell;
use tracing::info;

use crate::config::ServerSettings;
use crate::error::Result;
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::status::StatusPayload;
use crate::server::registry::Registry;
use crate::utils::crypto::KeyPair;
use crate::utils::metrics::Metrics;

/// Server-wide state shared by every session and the keepalive task.
#[derive(Debug)]
pub struct ServerContext {
    settings: ServerSettings,
    registry: Registry,
    dispatcher: Dispatcher,
    metrics: Metrics,
    keypair: OnceCell<KeyPair>,
}

impl ServerContext {
    pub fn new(settings: ServerSettings) -> Self {
        Self::with_dispatcher(settings, Dispatcher::with_default_handlers())
    }

    pub fn with_dispatcher(settings: ServerSettings, dispatcher: Dispatcher) -> Self {
        Self {
            settings,
            registry: Registry::new(),
            dispatcher,
            metrics: Metrics::new(),
            keypair: OnceCell::new(),
        }
    }

    /// Use `keys` instead of generating a key pair on first use.
    pub fn with_keypair(mut self, keys: KeyPair) -> Self {
        self.keypair = OnceCell::with_value(keys);
        self
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The server key pair, generated the first time a handler needs it.
    pub fn keypair(&self) -> Result<&KeyPair> {
        self.keypair.get_or_try_init(|| {
            info!("Generating server key pair");
            KeyPair::generate()
        })
    }

    pub fn online_count(&self) -> usize {
        self.registry.online_count()
    }

    /// Status JSON from the configured template and the current online count.
    pub fn status_payload(&self) -> StatusPayload {
        let online = u32::try_from(self.online_count()).unwrap_or(u32::MAX);
        StatusPayload::from_config(&self.settings.status, online)
    }
}
