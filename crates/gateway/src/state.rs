use std::sync::Arc;

use {igdm_auth::Carrier, igdm_client::DirectClient, igdm_config::IgdmConfig};

/// Builds a fresh external-client handle for one request.
pub type ClientFactory = Arc<dyn Fn() -> Box<dyn DirectClient> + Send + Sync>;

/// Shared application state.
///
/// Holds no client instance and nothing per-user: every request constructs
/// its own handle through the factory, so concurrent requests for
/// different identities cannot interfere.
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration, immutable for the process lifetime.
    pub config: Arc<IgdmConfig>,
    /// Signed carrier codec for the session cookie.
    pub carrier: Arc<Carrier>,
    /// Request-scoped client construction.
    pub clients: ClientFactory,
}

impl AppState {
    pub fn new(config: IgdmConfig, carrier: Carrier, clients: ClientFactory) -> Self {
        Self {
            config: Arc::new(config),
            carrier: Arc::new(carrier),
            clients,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.session.cookie_name
    }
}
