//! # reclaim-match
//!
//! Rule-based matching between lost and found item records.
//!
//! This crate provides:
//! - A pure, deterministic scoring function over one (lost, found) pair
//!   ([`scoring::score`])
//! - The [`MatchEngine`] coordinator, which fetches an anchor record and the
//!   eligible opposite-side pool from the collaborators, scores every pair,
//!   caches the results, and returns the top N candidates
//!
//! Scoring weights are fixed constants. Downstream ranking depends only on
//! their relative order, so they are deliberately not configurable.

pub mod engine;
pub mod scoring;

pub use engine::MatchEngine;
