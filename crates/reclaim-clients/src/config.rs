//! Collaborator endpoint configuration.

use reclaim_core::defaults::{
    COLLABORATOR_TIMEOUT_SECS, FOUND_SERVICE_URL, LOST_SERVICE_URL, NOTIFICATION_SERVICE_URL,
    USER_SERVICE_URL,
};

/// Base URLs and request timeout for the collaborator services.
#[derive(Debug, Clone)]
pub struct CollaboratorConfig {
    pub lost_url: String,
    pub found_url: String,
    pub notification_url: String,
    pub user_url: String,
    pub timeout_secs: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            lost_url: LOST_SERVICE_URL.to_string(),
            found_url: FOUND_SERVICE_URL.to_string(),
            notification_url: NOTIFICATION_SERVICE_URL.to_string(),
            user_url: USER_SERVICE_URL.to_string(),
            timeout_secs: COLLABORATOR_TIMEOUT_SECS,
        }
    }
}

impl CollaboratorConfig {
    /// Load configuration from environment variables with fallback to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("LOST_SERVICE_URL") {
            config.lost_url = normalize(val);
        }
        if let Ok(val) = std::env::var("FOUND_SERVICE_URL") {
            config.found_url = normalize(val);
        }
        if let Ok(val) = std::env::var("NOTIFICATION_SERVICE_URL") {
            config.notification_url = normalize(val);
        }
        if let Ok(val) = std::env::var("USER_SERVICE_URL") {
            config.user_url = normalize(val);
        }
        if let Ok(val) = std::env::var("COLLABORATOR_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.timeout_secs = secs.max(1);
            } else {
                tracing::warn!(value = %val, "Invalid COLLABORATOR_TIMEOUT_SECS, using default");
            }
        }

        config
    }
}

/// Base URLs are joined with absolute paths, so a trailing slash would
/// produce `//` in request URLs.
fn normalize(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
