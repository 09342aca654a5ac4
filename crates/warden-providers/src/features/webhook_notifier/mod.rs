use crate::features::http_transport::{HttpRequest, HttpTransport};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use warden_core::{CoreError, NotificationMessage, Notifier, Result};

const CAPABILITY: &str = "webhook";

/// Posts `{content, flags}` to a chat webhook URL. One attempt per message.
pub struct WebhookNotifier {
    transport: Arc<dyn HttpTransport>,
}

impl WebhookNotifier {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, destination: &str, message: &NotificationMessage) -> Result<()> {
        let url = reqwest::Url::parse(destination)
            .map_err(|e| CoreError::external(CAPABILITY, "notify", format!("invalid URL: {e}")))?;
        let body = serde_json::to_value(message)
            .map_err(|e| CoreError::external(CAPABILITY, "notify", e))?;

        let response = self
            .transport
            .execute(CAPABILITY, &HttpRequest::post(url.as_str(), Some(body)))
            .await?;
        if !response.is_success() {
            return Err(CoreError::external(
                CAPABILITY,
                "notify",
                format!("webhook returned status {}", response.status),
            ));
        }

        info!(host = url.host_str().unwrap_or_default(), "Notification delivered");
        Ok(())
    }
}
