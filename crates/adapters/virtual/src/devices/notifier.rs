//! Notifier that writes to the log.

use async_trait::async_trait;
use minerhub_app::ports::NotificationPort;
use minerhub_domain::error::MinerHubError;
use tracing::info;

/// Logs every notification at `info` level and always accepts it.
#[derive(Debug)]
pub struct LogNotifier {
    name: String,
}

impl LogNotifier {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl NotificationPort for LogNotifier {
    async fn send(&self, title: &str, message: &str) -> Result<bool, MinerHubError> {
        info!(notifier = %self.name, title, message, "notification");
        Ok(true)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
