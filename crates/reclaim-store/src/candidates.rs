//! Match candidate cache implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use reclaim_core::defaults::REASON_MAX_LENGTH;
use reclaim_core::{CandidateStore, MatchCandidate, Result};

#[derive(Default)]
struct Inner {
    next_id: i64,
    by_pair: HashMap<(i64, i64), MatchCandidate>,
}

/// In-memory implementation of [`CandidateStore`].
///
/// Keyed by (lost, found) pair, so re-scoring the same pair can never grow
/// a second row. Upserts serialize on the write lock.
pub struct InMemoryCandidateStore {
    inner: RwLock<Inner>,
}

impl InMemoryCandidateStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for InMemoryCandidateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn upsert(
        &self,
        lost_id: i64,
        found_id: i64,
        score: i32,
        reason: &str,
    ) -> Result<MatchCandidate> {
        let reason: String = reason.chars().take(REASON_MAX_LENGTH).collect();

        let mut inner = self.inner.write().await;
        let candidate = match inner.by_pair.get_mut(&(lost_id, found_id)) {
            Some(existing) => {
                existing.score = score;
                existing.reason = reason;
                existing.clone()
            }
            None => {
                inner.next_id += 1;
                let candidate = MatchCandidate {
                    id: inner.next_id,
                    lost_id,
                    found_id,
                    score,
                    reason,
                    viewed: false,
                    created_at: Utc::now(),
                };
                inner.by_pair.insert((lost_id, found_id), candidate.clone());
                candidate
            }
        };
        Ok(candidate)
    }

    async fn find_pair(&self, lost_id: i64, found_id: i64) -> Result<Option<MatchCandidate>> {
        let inner = self.inner.read().await;
        Ok(inner.by_pair.get(&(lost_id, found_id)).cloned())
    }
}
