//! # reclaim-store
//!
//! Storage layer for the reclaim handover coordinator.
//!
//! This crate provides in-memory implementations of the storage seams
//! defined in `reclaim-core`:
//! - [`InMemoryHandoverStore`] for handover records, with status
//!   re-validation inside the write path so concurrent transitions on one
//!   record cannot both win
//! - [`InMemoryCandidateStore`] for the scored-pair cache, with idempotent
//!   per-pair upserts
//!
//! Both stores hand out cloned records; callers never hold references into
//! the maps.

pub mod candidates;
pub mod handovers;

pub use candidates::InMemoryCandidateStore;
pub use handovers::InMemoryHandoverStore;
