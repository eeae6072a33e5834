//! Matching coordinator.
//!
//! Fetches the anchor record and the eligible opposite-side pool from the
//! collaborators, scores every pair, caches each pair's result, and returns
//! the top N. The anchor fetch is a hard failure (no candidates without an
//! anchor); an unreachable collaborator during the bulk fetch degrades to an
//! empty candidate list instead of failing the request.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, warn};

use reclaim_core::{
    CandidateStore, FoundRecordService, LostRecordService, RankedCandidate, Result,
};

use crate::scoring;

/// Coordinates matching passes over the collaborator record sets.
pub struct MatchEngine {
    lost: Arc<dyn LostRecordService>,
    found: Arc<dyn FoundRecordService>,
    candidates: Arc<dyn CandidateStore>,
}

impl MatchEngine {
    pub fn new(
        lost: Arc<dyn LostRecordService>,
        found: Arc<dyn FoundRecordService>,
        candidates: Arc<dyn CandidateStore>,
    ) -> Self {
        Self {
            lost,
            found,
            candidates,
        }
    }

    /// Ranks available found records against one lost record.
    pub async fn rank_for_lost(&self, lost_id: i64, top_n: usize) -> Result<Vec<RankedCandidate>> {
        let started = Instant::now();
        let anchor = self.lost.fetch(lost_id).await?;

        let pool = match self.found.list_available().await {
            Ok(items) => items,
            Err(err) => {
                warn!(
                    lost_id,
                    error = %err,
                    "found-record bulk fetch failed, returning no candidates"
                );
                Vec::new()
            }
        };

        let mut ranked: Vec<RankedCandidate> = pool
            .into_iter()
            .map(|item| {
                let (points, reasons) = scoring::score(&anchor, &item);
                RankedCandidate {
                    lost_id,
                    found_id: item.id,
                    score: points,
                    reason: reasons.join(", "),
                    lost_item: anchor.clone(),
                    found_item: item,
                }
            })
            .collect();

        self.cache_all(&ranked).await?;

        let scored_count = ranked.len();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked.truncate(top_n);

        debug!(
            lost_id,
            top_n,
            scored_count,
            result_count = ranked.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "matching pass for lost record complete"
        );
        Ok(ranked)
    }

    /// Ranks open lost records against one found record.
    pub async fn rank_for_found(
        &self,
        found_id: i64,
        top_n: usize,
    ) -> Result<Vec<RankedCandidate>> {
        let started = Instant::now();
        let anchor = self.found.fetch(found_id).await?;

        let pool = match self.lost.list_open().await {
            Ok(items) => items,
            Err(err) => {
                warn!(
                    found_id,
                    error = %err,
                    "lost-record bulk fetch failed, returning no candidates"
                );
                Vec::new()
            }
        };

        let mut ranked: Vec<RankedCandidate> = pool
            .into_iter()
            .map(|item| {
                let (points, reasons) = scoring::score(&item, &anchor);
                RankedCandidate {
                    lost_id: item.id,
                    found_id,
                    score: points,
                    reason: reasons.join(", "),
                    lost_item: item,
                    found_item: anchor.clone(),
                }
            })
            .collect();

        self.cache_all(&ranked).await?;

        let scored_count = ranked.len();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked.truncate(top_n);

        debug!(
            found_id,
            top_n,
            scored_count,
            result_count = ranked.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "matching pass for found record complete"
        );
        Ok(ranked)
    }

    /// Upserts every scored pair into the candidate cache. The upserts fan
    /// out concurrently; per-pair write ordering is the store's concern.
    async fn cache_all(&self, ranked: &[RankedCandidate]) -> Result<()> {
        let upserts = ranked
            .iter()
            .map(|c| self.candidates.upsert(c.lost_id, c.found_id, c.score, &c.reason));
        for result in join_all(upserts).await {
            result?;
        }
        Ok(())
    }
}
