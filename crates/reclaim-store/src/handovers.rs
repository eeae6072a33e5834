//! Handover record store implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use reclaim_core::defaults::{MEET_PLACE_MAX_LENGTH, REASON_MAX_LENGTH};
use reclaim_core::{
    Error, HandoverAction, HandoverRecord, HandoverStatus, HandoverStore, NewHandover, Result,
    TransitionPatch,
};

/// Truncates a free-text field to its stored length, on a char boundary.
fn clip(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    records: HashMap<i64, HandoverRecord>,
    by_pair: HashMap<(i64, i64), i64>,
}

/// In-memory implementation of [`HandoverStore`].
///
/// All mutations run under one write lock, and transitions re-derive the
/// next status from the stored record inside that lock. Two racing
/// transitions on the same record therefore serialize, and the loser gets
/// the same denial a plain illegal call would get.
pub struct InMemoryHandoverStore {
    inner: RwLock<Inner>,
}

impl InMemoryHandoverStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for InMemoryHandoverStore {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(mut records: Vec<HandoverRecord>) -> Vec<HandoverRecord> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    records
}

#[async_trait]
impl HandoverStore for InMemoryHandoverStore {
    async fn insert(&self, new: NewHandover) -> Result<HandoverRecord> {
        let mut inner = self.inner.write().await;
        let key = (new.lost_id, new.found_id);
        if inner.by_pair.contains_key(&key) {
            return Err(Error::InvalidTransition(format!(
                "handover already exists for lost record {} and found record {}",
                new.lost_id, new.found_id
            )));
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let now = Utc::now();
        let record = HandoverRecord {
            id,
            lost_id: new.lost_id,
            found_id: new.found_id,
            requester_id: new.requester_id,
            responder_id: new.responder_id,
            method: new.method,
            status: HandoverStatus::Requested,
            schedule_at: new.schedule_at,
            meet_place: new.meet_place.map(|p| clip(p, MEET_PLACE_MAX_LENGTH)),
            accepted_by_finder_at: None,
            verified_by_security_at: None,
            approved_by_office_at: None,
            completed_at: None,
            canceled_at: None,
            cancel_reason: None,
            contact_disclosed: false,
            created_at: now,
            updated_at: now,
        };
        inner.records.insert(id, record.clone());
        inner.by_pair.insert(key, id);
        tracing::debug!(handover_id = id, lost_id = key.0, found_id = key.1, "handover inserted");
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<HandoverRecord> {
        let inner = self.inner.read().await;
        inner
            .records
            .get(&id)
            .cloned()
            .ok_or(Error::HandoverNotFound(id))
    }

    async fn find_pair(&self, lost_id: i64, found_id: i64) -> Result<Option<HandoverRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_pair
            .get(&(lost_id, found_id))
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    async fn apply_transition(
        &self,
        id: i64,
        action: HandoverAction,
        patch: TransitionPatch,
    ) -> Result<HandoverRecord> {
        let patch = TransitionPatch {
            schedule_at: patch.schedule_at,
            meet_place: patch.meet_place.map(|p| clip(p, MEET_PLACE_MAX_LENGTH)),
            cancel_reason: patch.cancel_reason.map(|r| clip(r, REASON_MAX_LENGTH)),
        };

        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(&id)
            .ok_or(Error::HandoverNotFound(id))?;
        record.apply(action, &patch, Utc::now())?;
        tracing::debug!(handover_id = id, status = %record.status, "transition applied");
        Ok(record.clone())
    }

    async fn list_by_requester(&self, user_id: i64) -> Result<Vec<HandoverRecord>> {
        let inner = self.inner.read().await;
        let records = inner
            .records
            .values()
            .filter(|r| r.requester_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(records))
    }

    async fn list_by_responder(&self, user_id: i64) -> Result<Vec<HandoverRecord>> {
        let inner = self.inner.read().await;
        let records = inner
            .records
            .values()
            .filter(|r| r.responder_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(records))
    }

    async fn list_paged(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<HandoverRecord>, usize)> {
        let inner = self.inner.read().await;
        let all: Vec<HandoverRecord> = inner.records.values().cloned().collect();
        drop(inner);

        let total = all.len();
        let page = newest_first(all).into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn count_completed(
        &self,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<u64> {
        let inner = self.inner.read().await;
        let count = inner
            .records
            .values()
            .filter(|r| r.status == HandoverStatus::Completed)
            .filter(|r| match (window, r.completed_at) {
                (None, _) => true,
                (Some((start, end)), Some(at)) => at >= start && at < end,
                (Some(_), None) => false,
            })
            .count();
        Ok(count as u64)
    }
}
