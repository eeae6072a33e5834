//! Centralized default constants for the reclaim handover coordinator.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates should reference these constants instead of defining
//! their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8085;

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

/// Maximum request body size in bytes (1 MB). All request bodies here are
/// small JSON documents.
pub const MAX_BODY_SIZE_BYTES: usize = 1024 * 1024;

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Default base URL of the user directory.
pub const USER_SERVICE_URL: &str = "http://localhost:8081";

/// Default base URL of the lost-record collaborator.
pub const LOST_SERVICE_URL: &str = "http://localhost:8082";

/// Default base URL of the found-record collaborator.
pub const FOUND_SERVICE_URL: &str = "http://localhost:8083";

/// Default base URL of the notification collaborator.
pub const NOTIFICATION_SERVICE_URL: &str = "http://localhost:8084";

/// Timeout for collaborator HTTP requests in seconds. Collaborator calls
/// sit on the request path, so this stays short.
pub const COLLABORATOR_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for handover list endpoints.
pub const PAGE_LIMIT: usize = 50;

/// Maximum accepted page size.
pub const PAGE_LIMIT_MAX: usize = 200;

/// Default page offset.
pub const PAGE_OFFSET: usize = 0;

// =============================================================================
// MATCHING
// =============================================================================

/// Default number of ranked candidates returned per query.
pub const MATCH_TOP_N: usize = 10;

/// Maximum accepted `topN` value.
pub const MATCH_TOP_N_MAX: usize = 100;

/// Page size used when bulk-fetching open records from the collaborators
/// for a matching pass.
pub const BULK_FETCH_SIZE: usize = 1000;

// =============================================================================
// FIELD LIMITS
// =============================================================================

/// Maximum stored length of free-text reasons (cancel reasons and match
/// reason decompositions). Longer values are truncated, not rejected.
pub const REASON_MAX_LENGTH: usize = 500;

/// Maximum accepted length of a meeting place description.
pub const MEET_PLACE_MAX_LENGTH: usize = 200;

// =============================================================================
// MATCHING CONFIGURATION
// =============================================================================

/// Tunable parameters of a matching pass.
///
/// Read from environment variables at startup; scoring weights themselves
/// are fixed (see the scoring module) because downstream ranking depends on
/// their relative order.
#[derive(Debug, Clone)]
pub struct MatchTuning {
    /// Number of ranked candidates returned when the caller gives no `topN`.
    pub top_n: usize,
    /// Page size for bulk-fetching open records.
    pub bulk_fetch_size: usize,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            top_n: MATCH_TOP_N,
            bulk_fetch_size: BULK_FETCH_SIZE,
        }
    }
}

impl MatchTuning {
    /// Load configuration from environment variables with fallback to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MATCH_TOP_N") {
            if let Ok(n) = val.parse::<usize>() {
                config.top_n = n.clamp(1, MATCH_TOP_N_MAX);
            } else {
                tracing::warn!(value = %val, "Invalid MATCH_TOP_N, using default");
            }
        }

        if let Ok(val) = std::env::var("MATCH_BULK_FETCH_SIZE") {
            if let Ok(n) = val.parse::<usize>() {
                config.bulk_fetch_size = n.clamp(1, 10_000);
            } else {
                tracing::warn!(value = %val, "Invalid MATCH_BULK_FETCH_SIZE, using default");
            }
        }

        config
    }
}
