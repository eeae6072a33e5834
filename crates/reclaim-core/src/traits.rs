//! Service and storage seams.
//!
//! Every side-effecting dependency of the workflow and matching engines is
//! behind one of these traits, so the engines can be exercised against
//! in-memory doubles and the binary can wire live implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    FoundRecordView, HandoverRecord, LostRecordView, MatchCandidate, NewHandover,
    NotificationRequest, Role,
};
use crate::transitions::{HandoverAction, TransitionPatch};

/// Durable storage for handover records.
#[async_trait]
pub trait HandoverStore: Send + Sync {
    /// Inserts a new record in `Requested` status and assigns its id.
    async fn insert(&self, new: NewHandover) -> Result<HandoverRecord>;

    /// Fetches one record, `Error::HandoverNotFound` when absent.
    async fn get(&self, id: i64) -> Result<HandoverRecord>;

    /// The record for a (lost, found) pair regardless of status, if any.
    async fn find_pair(&self, lost_id: i64, found_id: i64) -> Result<Option<HandoverRecord>>;

    /// Applies a transition atomically. The legality of
    /// `(current status, action)` is re-checked against the stored record
    /// inside the store's write path, so concurrent writers cannot both
    /// move the same record.
    async fn apply_transition(
        &self,
        id: i64,
        action: HandoverAction,
        patch: TransitionPatch,
    ) -> Result<HandoverRecord>;

    /// All records where the user is the requester, newest first.
    async fn list_by_requester(&self, user_id: i64) -> Result<Vec<HandoverRecord>>;

    /// All records where the user is the responder, newest first.
    async fn list_by_responder(&self, user_id: i64) -> Result<Vec<HandoverRecord>>;

    /// One page of all records, newest first, plus the total count.
    async fn list_paged(&self, limit: usize, offset: usize) -> Result<(Vec<HandoverRecord>, usize)>;

    /// Number of completed handovers, optionally restricted to a half-open
    /// `[start, end)` window on `completedAt`.
    async fn count_completed(&self, window: Option<(DateTime<Utc>, DateTime<Utc>)>) -> Result<u64>;
}

/// Cache of scored (lost, found) pairs.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Inserts or updates the row for a pair. An update overwrites score and
    /// reason but preserves `viewed` and `createdAt`.
    async fn upsert(
        &self,
        lost_id: i64,
        found_id: i64,
        score: i32,
        reason: &str,
    ) -> Result<MatchCandidate>;

    /// The cached row for a pair, if one exists.
    async fn find_pair(&self, lost_id: i64, found_id: i64) -> Result<Option<MatchCandidate>>;
}

/// Client for the lost-record collaborator.
#[async_trait]
pub trait LostRecordService: Send + Sync {
    /// Fetches one lost record, `Error::NotFound` when the collaborator
    /// reports it missing.
    async fn fetch(&self, id: i64) -> Result<LostRecordView>;

    /// All lost records still open for matching.
    async fn list_open(&self) -> Result<Vec<LostRecordView>>;

    /// Compensating call after completion: close the lost record.
    async fn close(&self, id: i64) -> Result<()>;
}

/// Client for the found-record collaborator.
#[async_trait]
pub trait FoundRecordService: Send + Sync {
    /// Fetches one found record, `Error::NotFound` when the collaborator
    /// reports it missing.
    async fn fetch(&self, id: i64) -> Result<FoundRecordView>;

    /// All found records still available for matching.
    async fn list_available(&self) -> Result<Vec<FoundRecordView>>;

    /// Compensating call after completion: mark the found record handed
    /// over.
    async fn mark_handed_over(&self, id: i64) -> Result<()>;
}

/// Client for the notification collaborator.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send(&self, request: NotificationRequest) -> Result<()>;
}

/// Discards every notification. Useful in tests and as a wiring fallback
/// when no notification collaborator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotificationService;

#[async_trait]
impl NotificationService for NoOpNotificationService {
    async fn send(&self, _request: NotificationRequest) -> Result<()> {
        Ok(())
    }
}

/// Client for the user directory.
#[async_trait]
pub trait UserDirectoryService: Send + Sync {
    /// Ids of every user holding the given role.
    async fn ids_with_role(&self, role: Role) -> Result<Vec<i64>>;
}
