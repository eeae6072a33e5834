//! Notification collaborator client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

use reclaim_core::{Error, NotificationRequest, NotificationService, Result};

use crate::config::CollaboratorConfig;

/// HTTP client for the notification collaborator.
///
/// Dispatch is fire-and-forget from the workflow's point of view: the
/// response body is ignored and the call is never retried. Callers decide
/// whether a returned error is worth more than a warning.
pub struct HttpNotificationService {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpNotificationService {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn from_config(config: &CollaboratorConfig) -> Self {
        Self::new(config.notification_url.clone(), config.timeout_secs)
    }
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    #[instrument(
        skip(self, request),
        fields(
            subsystem = "clients",
            component = "notifications",
            op = "send",
            user_id = request.user_id,
            kind = %request.kind,
        )
    )]
    async fn send(&self, request: NotificationRequest) -> Result<()> {
        let url = format!("{}/notifications", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("notification service: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::CollaboratorUnavailable(format!(
                "notification service returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
