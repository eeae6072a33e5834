//! Found-record collaborator client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use reclaim_core::defaults::BULK_FETCH_SIZE;
use reclaim_core::{Error, FoundRecordService, FoundRecordView, Result};

use crate::config::CollaboratorConfig;
use crate::retry::send_lookup;

/// Status written back when a handover completes.
const HANDED_OVER_STATUS: &str = "HANDED_OVER";

/// Found records still eligible for matching.
const ELIGIBLE_STATUSES: [&str; 2] = ["REGISTERED", "STORED"];

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

/// HTTP client for the found-record collaborator.
pub struct HttpFoundRecordService {
    client: Client,
    base_url: String,
    timeout: Duration,
    bulk_fetch_size: usize,
}

impl HttpFoundRecordService {
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
        Self::new(config.found_url.clone(), config.timeout_secs, BULK_FETCH_SIZE)
    }
}

#[async_trait]
impl FoundRecordService for HttpFoundRecordService {
    #[instrument(skip(self), fields(subsystem = "clients", component = "found", op = "fetch"))]
    async fn fetch(&self, id: i64) -> Result<FoundRecordView> {
        let url = format!("{}/found/{}", self.base_url, id);
        let response = send_lookup(self.client.get(&url).timeout(self.timeout))
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("found service: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("found record {}", id)));
        }
        if !response.status().is_success() {
            return Err(Error::CollaboratorUnavailable(format!(
                "found service returned {}",
                response.status()
            )));
        }

        response
            .json::<FoundRecordView>()
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("found service: {}", e)))
    }

    #[instrument(skip(self), fields(subsystem = "clients", component = "found", op = "list_available"))]
    async fn list_available(&self) -> Result<Vec<FoundRecordView>> {
        let url = format!("{}/found?size={}", self.base_url, self.bulk_fetch_size);
        let response = send_lookup(self.client.get(&url).timeout(self.timeout))
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("found service: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::CollaboratorUnavailable(format!(
                "found service returned {}",
                response.status()
            )));
        }

        let page: PageEnvelope<FoundRecordView> = response
            .json()
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("found service: {}", e)))?;

        let available: Vec<FoundRecordView> = page
            .content
            .into_iter()
            .filter(|item| {
                item.status
                    .as_deref()
                    .map(|s| ELIGIBLE_STATUSES.contains(&s))
                    .unwrap_or(false)
            })
            .collect();
        debug!(result_count = available.len(), "available found records fetched");
        Ok(available)
    }

    #[instrument(skip(self), fields(subsystem = "clients", component = "found", op = "mark_handed_over"))]
    async fn mark_handed_over(&self, id: i64) -> Result<()> {
        let url = format!("{}/found/{}/status", self.base_url, id);
        let response = self
            .client
            .put(&url)
            .timeout(self.timeout)
            .json(&StatusUpdate {
                status: HANDED_OVER_STATUS,
            })
            .send()
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("found service: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("found record {}", id)));
        }
        if !response.status().is_success() {
            return Err(Error::CollaboratorUnavailable(format!(
                "found service returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
