//! # reclaim-handover
//!
//! Handover lifecycle orchestration for reclaim.
//!
//! This crate provides:
//! - The handover workflow: guarded transitions from `Requested` through
//!   `Completed`, with authorization checks against the caller identity
//! - Category-conditional security review routing
//! - Compensating status propagation to the lost/found collaborators on
//!   completion (logged-and-continue, never rolled back)
//! - Best-effort notification fan-out for every lifecycle event
//!
//! The workflow owns no I/O of its own; stores and collaborator clients are
//! injected behind the `reclaim-core` traits, so the whole state machine can
//! be exercised against in-memory doubles.

pub mod notify;
pub mod workflow;

pub use notify::Notifier;
pub use workflow::HandoverWorkflow;
