//! # reclaim-core
//!
//! Core types, traits, and abstractions for the reclaim handover coordinator.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other reclaim crates depend on: the handover record and its status
//! machine, match candidates, collaborator item views, the error taxonomy, and
//! the store/collaborator trait seams. It performs no I/O of its own.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod transitions;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use transitions::{next_status, transition_denied, HandoverAction, TransitionPatch};
