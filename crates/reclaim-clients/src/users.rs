//! User directory client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use reclaim_core::{Error, Result, Role, UserDirectoryService};

use crate::config::CollaboratorConfig;

/// The directory serves full user objects; only the id is needed here and
/// the remaining fields are dropped on deserialization.
#[derive(Deserialize)]
struct UserSummary {
    id: i64,
}

/// HTTP client for the user directory. Used only for the security-reviewer
/// fan-out, so the surface is a single by-role lookup.
pub struct HttpUserDirectoryService {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpUserDirectoryService {
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
        Self::new(config.user_url.clone(), config.timeout_secs)
    }
}

#[async_trait]
impl UserDirectoryService for HttpUserDirectoryService {
    #[instrument(skip(self), fields(subsystem = "clients", component = "users", op = "ids_with_role", role = %role))]
    async fn ids_with_role(&self, role: Role) -> Result<Vec<i64>> {
        let url = format!("{}/users/by-role/{}", self.base_url, role);
        let response = crate::retry::send_lookup(self.client.get(&url).timeout(self.timeout))
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("user service: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::CollaboratorUnavailable(format!(
                "user service returned {}",
                response.status()
            )));
        }

        let users: Vec<UserSummary> = response
            .json()
            .await
            .map_err(|e| Error::CollaboratorUnavailable(format!("user service: {}", e)))?;
        let ids: Vec<i64> = users.into_iter().map(|u| u.id).collect();
        debug!(result_count = ids.len(), "users resolved by role");
        Ok(ids)
    }
}
