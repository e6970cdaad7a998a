//! Webhook plugins and their registry.

use async_trait::async_trait;
use hookline_core::Result;
use hookline_core::git::{EventType, Webhook};
use hookline_core::integration::IntegrationConfig;
use std::sync::Arc;
use tracing::{debug, error};

/// A consumer of canonical webhooks.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Event types this plugin wants to see.
    fn handles(&self) -> &[EventType];

    async fn on_webhook(&self, webhook: &Webhook, config: &IntegrationConfig) -> Result<()>;
}

/// Outcome of running the plugins for one delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PluginReport {
    pub ran: usize,
    pub failed: usize,
}

/// Plugins grouped by the event types they handle.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        debug!(plugin = plugin.name(), events = ?plugin.handles(), "Registered plugin");
        self.plugins.push(plugin);
    }

    /// Plugins registered for `event_type`, in registration order.
    pub fn plugins_for(&self, event_type: EventType) -> impl Iterator<Item = &Arc<dyn Plugin>> {
        self.plugins
            .iter()
            .filter(move |p| p.handles().contains(&event_type))
    }

    /// Run every plugin registered for the webhook's event type.
    ///
    /// A failing plugin is logged and does not stop the others.
    pub async fn run(&self, webhook: &Webhook, config: &IntegrationConfig) -> PluginReport {
        let mut report = PluginReport::default();
        for plugin in self.plugins_for(webhook.event_type) {
            report.ran += 1;
            if let Err(e) = plugin.on_webhook(webhook, config).await {
                report.failed += 1;
                error!(
                    plugin = plugin.name(),
                    config = %config.name,
                    event = %webhook.event_type,
                    error = %e,
                    "Plugin failed"
                );
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookline_core::Error;
    use hookline_core::git::{GitHost, Push, Repository, User};
    use hookline_core::integration::GitConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPlugin {
        events: Vec<EventType>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingPlugin {
        fn new(events: Vec<EventType>, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                events,
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl Plugin for CountingPlugin {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn handles(&self) -> &[EventType] {
            &self.events
        }

        async fn on_webhook(&self, _webhook: &Webhook, _config: &IntegrationConfig) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Internal("boom".to_string()));
            }
            Ok(())
        }
    }

    fn config() -> IntegrationConfig {
        IntegrationConfig::new(
            "app",
            "ci",
            GitConfig {
                host: GitHost::Gitlab,
                repository: "group/project".to_string(),
                server_url: None,
                token: None,
            },
            "secret",
        )
    }

    fn push() -> Webhook {
        Webhook::push(
            Repository::default(),
            Push {
                r#ref: "refs/heads/main".to_string(),
                sha: "abc".to_string(),
                sender: User::default(),
            },
        )
    }

    #[tokio::test]
    async fn test_only_matching_plugins_run() {
        let push_plugin = CountingPlugin::new(vec![EventType::Push], false);
        let comment_plugin = CountingPlugin::new(vec![EventType::IssueComment], false);

        let mut registry = PluginRegistry::new();
        registry.register(push_plugin.clone());
        registry.register(comment_plugin.clone());

        let report = registry.run(&push(), &config()).await;
        assert_eq!(report, PluginReport { ran: 1, failed: 0 });
        assert_eq!(push_plugin.calls.load(Ordering::SeqCst), 1);
        assert_eq!(comment_plugin.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_plugin_does_not_stop_others() {
        let failing = CountingPlugin::new(vec![EventType::Push], true);
        let healthy = CountingPlugin::new(vec![EventType::Push], false);

        let mut registry = PluginRegistry::new();
        registry.register(failing.clone());
        registry.register(healthy.clone());

        let report = registry.run(&push(), &config()).await;
        assert_eq!(report, PluginReport { ran: 2, failed: 1 });
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_plugins_for_event() {
        let registry = PluginRegistry::new();
        let report = registry.run(&push(), &config()).await;
        assert_eq!(report, PluginReport::default());
    }
}
