//! Application state.

use hookline_config::ConfigStore;
use hookline_core::JobSink;
use hookline_dispatcher::{Dispatcher, PluginRegistry};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub configs: Arc<ConfigStore>,
    pub plugins: Arc<PluginRegistry>,
    /// Client for outbound git provider calls.
    pub http: reqwest::Client,
}

impl AppState {
    /// State with the dispatcher registered as the only plugin.
    pub fn new(configs: ConfigStore, sink: Arc<dyn JobSink>, http: reqwest::Client) -> Self {
        let mut plugins = PluginRegistry::new();
        plugins.register(Arc::new(Dispatcher::new(sink)));
        Self::with_plugins(configs, plugins, http)
    }

    pub fn with_plugins(
        configs: ConfigStore,
        plugins: PluginRegistry,
        http: reqwest::Client,
    ) -> Self {
        Self {
            configs: Arc::new(configs),
            plugins: Arc::new(plugins),
            http,
        }
    }
}
