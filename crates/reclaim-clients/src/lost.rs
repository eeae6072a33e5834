//! Lost-record collaborator client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use reclaim_core::defaults::BULK_FETCH_SIZE;
use reclaim_core::{Error, LostRecordService, LostRecordView, Result};

use crate::config::CollaboratorConfig;
use crate::retry::send_lookup;

/// Status written back when a handover completes.
const CLOSED_STATUS: &str = "CLOSED";

/// Lost records still eligible for matching.
const OPEN_STATUS: &str = "OPEN";

/// Spring-style page envelope the collaborator wraps list responses in.
#[derive(Deserialize)]
struct PageEnvelope<T> {
    // Path form: plain `default` would make serde bound T: Default.
    #[serde(default = "Vec::new")]
    content: Vec<T>,
}

#[derive(Serialize)]
struct StatusUpdate<'a> {
    status: &'a str,
}

/// HTTP client for the lost-record collaborator.
pub struct HttpLostRecordService {
    client: Client,
    base_url: String,
    timeout: Duration,
    bulk_fetch_size: usize,
}

impl HttpLostRecordService {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64, bulk_fetch_size: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.into(),
            timeout: Duration::from_secs(timeout_secs),
            bulk_fetch_size,
        }
    }

    pub fn from_config(config: &CollaboratorConfig) -> Self {
        Self::new(config.lost_url.clone(), config.timeout_secs, BULK_FETCH_SIZE)
    }
}

#[async_trait]
impl LostRecordService for HttpLostRecordService {
    #[instrument(skip(self), fields(subsystem = "clients", component = "lost", op = "fetch"))]
    async fn fetch(&self, id: i64) -> Result<LostRecordView> {
        let url = format!("{}/lost/{}", self.base_url, id);
        let response = send_lookup(self.client.get(&url).timeout(self.timeout))
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("lost service: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("lost record {}", id)));
        }
        if !response.status().is_success() {
            return Err(Error::CollaboratorUnavailable(format!(
                "lost service returned {}",
                response.status()
            )));
        }

        response
            .json::<LostRecordView>()
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("lost service: {}", e)))
    }

    #[instrument(skip(self), fields(subsystem = "clients", component = "lost", op = "list_open"))]
    async fn list_open(&self) -> Result<Vec<LostRecordView>> {
        let url = format!("{}/lost?size={}", self.base_url, self.bulk_fetch_size);
        let response = send_lookup(self.client.get(&url).timeout(self.timeout))
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("lost service: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::CollaboratorUnavailable(format!(
                "lost service returned {}",
                response.status()
            )));
        }

        let page: PageEnvelope<LostRecordView> = response
            .json()
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("lost service: {}", e)))?;

        let open: Vec<LostRecordView> = page
            .content
            .into_iter()
            .filter(|item| item.status.as_deref() == Some(OPEN_STATUS))
            .collect();
        debug!(result_count = open.len(), "open lost records fetched");
        Ok(open)
    }

    #[instrument(skip(self), fields(subsystem = "clients", component = "lost", op = "close"))]
    async fn close(&self, id: i64) -> Result<()> {
        let url = format!("{}/lost/{}/status", self.base_url, id);
        let response = self
            .client
            .put(&url)
            .timeout(self.timeout)
            .json(&StatusUpdate {
                status: CLOSED_STATUS,
            })
            .send()
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("lost service: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("lost record {}", id)));
        }
        if !response.status().is_success() {
            return Err(Error::CollaboratorUnavailable(format!(
                "lost service returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
