//! Structured logging schema and field name constants for reclaim.
//!
//! Every crate logs through these field names, so log aggregation tools
//! (Loki, Elasticsearch) can follow one handover across the api, workflow,
//! and collaborator-client subsystems with a single query.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied (unreachable collaborator, failed compensation) |
//! | INFO  | Lifecycle events (startup, shutdown), completed transitions |
//! | DEBUG | Decision points, guard evaluations, scoring summaries |
//! | TRACE | Per-candidate iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → workflow → collaborator calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "workflow", "matching", "store", "clients"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "scoring", "notify", "lost_client", "found_client"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create", "accept", "complete", "rank_for_lost"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Handover record id being operated on.
pub const HANDOVER_ID: &str = "handover_id";

/// Lost record id.
pub const LOST_ID: &str = "lost_id";

/// Found record id.
pub const FOUND_ID: &str = "found_id";

/// Acting user id (from gateway identity headers).
pub const USER_ID: &str = "user_id";

/// Handover status after the logged operation.
pub const STATUS: &str = "status";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query or ranking pass.
pub const RESULT_COUNT: &str = "result_count";

/// Number of candidate pairs scored in a matching pass.
pub const SCORED_COUNT: &str = "scored_count";

/// Number of notifications dispatched by a fan-out.
pub const NOTIFY_COUNT: &str = "notify_count";

// ─── Matching fields ───────────────────────────────────────────────────────

/// Compatibility score of a pair.
pub const SCORE: &str = "score";

/// Requested number of top candidates.
pub const TOP_N: &str = "top_n";

// ─── Collaborator fields ───────────────────────────────────────────────────

/// Collaborator service targeted by an HTTP call.
/// Values: "lost", "found", "notifications", "users"
pub const COLLABORATOR: &str = "collaborator";

/// HTTP status code returned by a collaborator.
pub const HTTP_STATUS: &str = "http_status";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
