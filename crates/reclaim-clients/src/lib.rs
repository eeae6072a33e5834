//! # reclaim-clients
//!
//! HTTP clients for the collaborator services the handover coordinator
//! depends on: the lost-record service, the found-record service, the
//! notification service, and the user directory.
//!
//! Every client implements the matching `reclaim-core` trait, carries a
//! bounded per-request timeout, and maps collaborator errors into the
//! shared taxonomy (404 → `NotFound`, transport failures and non-success
//! statuses → `CollaboratorUnavailable`). Idempotent lookups retry once on
//! a transport failure; mutating calls and notification dispatch never
//! retry, so a flaky collaborator cannot receive duplicate side effects.

pub mod config;
pub mod found;
pub mod lost;
pub mod notifications;
pub mod users;

mod retry;

pub use config::CollaboratorConfig;
pub use found::HttpFoundRecordService;
pub use lost::HttpLostRecordService;
pub use notifications::HttpNotificationService;
pub use users::HttpUserDirectoryService;
