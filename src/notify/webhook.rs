use crate::notify::notifier::Notification;
use anyhow::{bail, Context, Result};
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Delivers notifications to an operator webhook
pub struct WebhookClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl WebhookClient {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    pub async fn deliver(&self, notification: &Notification) -> Result<()> {
        let mut request = self.client.post(&self.endpoint).json(notification);
        if let Some(api_key) = &self.api_key {
            request = request.query(&[("api_key", api_key)]);
        }

        let response = request
            .send()
            .await
            .context("Failed to send notification to webhook")?;

        if !response.status().is_success() {
            bail!("Webhook returned error status: {}", response.status());
        }

        Ok(())
    }
}

/// Drain queued notifications into the webhook until every sender is dropped.
///
/// Delivery failures are logged and the notification is dropped.
pub fn spawn_dispatcher(
    mut receiver: Receiver<Notification>,
    client: WebhookClient,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = receiver.recv().await {
            match client.deliver(&notification).await {
                Ok(()) => debug!(kind = ?notification.kind, "Notification delivered"),
                Err(e) => warn!(
                    kind = ?notification.kind,
                    error = %e,
                    "Failed to deliver notification"
                ),
            }
        }
        debug!("Notification dispatcher stopped");
    })
}
