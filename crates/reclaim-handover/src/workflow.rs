//! Guarded handover transitions and their side effects.
//!
//! Every mutation funnels through [`HandoverWorkflow`]: authorization
//! against the caller identity first, then the transition guard, then
//! best-effort side effects (security routing, compensating status
//! propagation, notifications). The status guard is re-validated inside the
//! store's write path, so two racing transitions on one record cannot both
//! win; pre-checks here only order the error reporting.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use reclaim_core::{
    next_status, transition_denied, Caller, CreateHandoverRequest, Error, FoundRecordService,
    HandoverAction, HandoverRecord, HandoverStore, LostRecordService, NewHandover, Result, Role,
    ScheduleRequest, TransitionPatch,
};

use crate::notify::Notifier;

/// The handover state machine.
pub struct HandoverWorkflow {
    store: Arc<dyn HandoverStore>,
    lost: Arc<dyn LostRecordService>,
    found: Arc<dyn FoundRecordService>,
    notifier: Notifier,
}

impl HandoverWorkflow {
    pub fn new(
        store: Arc<dyn HandoverStore>,
        lost: Arc<dyn LostRecordService>,
        found: Arc<dyn FoundRecordService>,
        notifier: Notifier,
    ) -> Self {
        Self {
            store,
            lost,
            found,
            notifier,
        }
    }

    /// Creates a handover in `Requested` for a (lost, found) pair.
    ///
    /// Guard order: duplicate pair, then found-record resolution (which
    /// also fixes the responder), then lost-record resolution. The caller
    /// becomes the requester; the responder always comes from the found
    /// record's owner, never from caller input.
    #[instrument(skip(self, request), fields(subsystem = "workflow", op = "create", lost_id = request.lost_id, found_id = request.found_id))]
    pub async fn create(
        &self,
        caller: &Caller,
        request: CreateHandoverRequest,
    ) -> Result<HandoverRecord> {
        if self
            .store
            .find_pair(request.lost_id, request.found_id)
            .await?
            .is_some()
        {
            return Err(Error::InvalidTransition(format!(
                "handover already exists for lost record {} and found record {}",
                request.lost_id, request.found_id
            )));
        }

        let found_view = self.found.fetch(request.found_id).await?;
        self.lost.fetch(request.lost_id).await?;

        let record = self
            .store
            .insert(NewHandover {
                lost_id: request.lost_id,
                found_id: request.found_id,
                requester_id: caller.user_id,
                responder_id: found_view.owner_user_id,
                method: request.method,
                schedule_at: request.schedule_at,
                meet_place: request.meet_place,
            })
            .await?;

        info!(
            subsystem = "workflow",
            handover_id = record.id,
            status = %record.status,
            "Handover requested"
        );
        self.notifier.handover_requested(&record).await;
        Ok(record)
    }

    /// `Requested -> AcceptedByFinder`. Responder only.
    ///
    /// When the found item's category requires a security review, every
    /// security-role user is notified. Resolving the item for that routing
    /// decision is best-effort and never blocks the acceptance itself.
    #[instrument(skip(self), fields(subsystem = "workflow", op = "accept", handover_id = id))]
    pub async fn accept(&self, caller: &Caller, id: i64) -> Result<HandoverRecord> {
        let record = self.store.get(id).await?;
        if caller.user_id != record.responder_id {
            return Err(Error::Unauthorized(
                "only the responder may accept a handover".to_string(),
            ));
        }

        let updated = self
            .store
            .apply_transition(id, HandoverAction::Accept, TransitionPatch::empty())
            .await?;
        info!(
            subsystem = "workflow",
            handover_id = id,
            status = %updated.status,
            "Handover accepted"
        );

        match self.found.fetch(updated.found_id).await {
            Ok(view) if view.security_review_required() => {
                self.notifier.security_check_required(&updated).await;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    subsystem = "workflow",
                    handover_id = id,
                    found_id = updated.found_id,
                    error = %e,
                    "Could not resolve found record for security routing; skipping fan-out"
                );
            }
        }
        self.notifier.handover_accepted(&updated).await;
        Ok(updated)
    }

    /// `Requested -> Rejected`. Responder only; terminal.
    #[instrument(skip(self, reason), fields(subsystem = "workflow", op = "reject", handover_id = id))]
    pub async fn reject(
        &self,
        caller: &Caller,
        id: i64,
        reason: Option<String>,
    ) -> Result<HandoverRecord> {
        let record = self.store.get(id).await?;
        if caller.user_id != record.responder_id {
            return Err(Error::Unauthorized(
                "only the responder may reject a handover".to_string(),
            ));
        }

        let updated = self
            .store
            .apply_transition(id, HandoverAction::Reject, TransitionPatch::with_reason(reason))
            .await?;
        info!(
            subsystem = "workflow",
            handover_id = id,
            status = %updated.status,
            "Handover rejected"
        );
        self.notifier.handover_rejected(&updated).await;
        Ok(updated)
    }

    /// `AcceptedByFinder -> VerifiedBySecurity`. Security role only, and
    /// only for items whose category actually requires the review; the
    /// verification path cannot rubber-stamp non-sensitive items.
    #[instrument(skip(self), fields(subsystem = "workflow", op = "verify", handover_id = id))]
    pub async fn verify(&self, caller: &Caller, id: i64) -> Result<HandoverRecord> {
        if !caller.has_role(Role::Security) {
            return Err(Error::Unauthorized("security role required".to_string()));
        }

        let record = self.store.get(id).await?;
        // Status guard before the category guard, so a stale record reports
        // its state rather than a category complaint.
        if next_status(record.status, HandoverAction::Verify).is_none() {
            return Err(transition_denied(record.status, HandoverAction::Verify));
        }
        let view = self.found.fetch(record.found_id).await?;
        if !view.security_review_required() {
            return Err(Error::InvalidTransition(format!(
                "found record {} does not require a security check",
                record.found_id
            )));
        }

        let updated = self
            .store
            .apply_transition(id, HandoverAction::Verify, TransitionPatch::empty())
            .await?;
        info!(
            subsystem = "workflow",
            handover_id = id,
            status = %updated.status,
            "Security check recorded"
        );
        self.notifier.handover_verified(&updated).await;
        Ok(updated)
    }

    /// `AcceptedByFinder | VerifiedBySecurity -> ApprovedByOffice`. Office
    /// role only. Discloses contact details, irreversibly.
    #[instrument(skip(self), fields(subsystem = "workflow", op = "approve", handover_id = id))]
    pub async fn approve(&self, caller: &Caller, id: i64) -> Result<HandoverRecord> {
        if !caller.has_role(Role::Office) {
            return Err(Error::Unauthorized("office role required".to_string()));
        }

        let updated = self
            .store
            .apply_transition(id, HandoverAction::Approve, TransitionPatch::empty())
            .await?;
        info!(
            subsystem = "workflow",
            handover_id = id,
            status = %updated.status,
            "Handover approved; contact details disclosed"
        );
        self.notifier.handover_approved(&updated).await;
        Ok(updated)
    }

    /// `ApprovedByOffice -> Scheduled`. Sets the meeting time and place.
    #[instrument(skip(self, request), fields(subsystem = "workflow", op = "schedule", handover_id = id))]
    pub async fn schedule(
        &self,
        caller: &Caller,
        id: i64,
        request: ScheduleRequest,
    ) -> Result<HandoverRecord> {
        let updated = self
            .store
            .apply_transition(
                id,
                HandoverAction::Schedule,
                TransitionPatch::scheduled(request.schedule_at, request.meet_place),
            )
            .await?;
        info!(
            subsystem = "workflow",
            handover_id = id,
            user_id = caller.user_id,
            status = %updated.status,
            "Handover scheduled"
        );
        self.notifier.handover_scheduled(&updated).await;
        Ok(updated)
    }

    /// `Scheduled -> Completed`. The record commits first; the two
    /// compensating collaborator calls (close the lost record, mark the
    /// found record handed over) are logged-and-continue afterwards, so an
    /// unreachable collaborator leaves a reconcilable gap instead of
    /// blocking completion.
    #[instrument(skip(self), fields(subsystem = "workflow", op = "complete", handover_id = id))]
    pub async fn complete(&self, caller: &Caller, id: i64) -> Result<HandoverRecord> {
        let updated = self
            .store
            .apply_transition(id, HandoverAction::Complete, TransitionPatch::empty())
            .await?;
        info!(
            subsystem = "workflow",
            handover_id = id,
            user_id = caller.user_id,
            status = %updated.status,
            "Handover completed"
        );

        if let Err(e) = self.lost.close(updated.lost_id).await {
            warn!(
                subsystem = "workflow",
                handover_id = id,
                lost_id = updated.lost_id,
                error = %e,
                "Lost-record close not acknowledged; left for reconciliation"
            );
        }
        if let Err(e) = self.found.mark_handed_over(updated.found_id).await {
            warn!(
                subsystem = "workflow",
                handover_id = id,
                found_id = updated.found_id,
                error = %e,
                "Found-record status propagation not acknowledged; left for reconciliation"
            );
        }
        self.notifier.handover_completed(&updated).await;
        Ok(updated)
    }

    /// Any non-terminal status `-> Canceled`. Either party may cancel; the
    /// other party is notified.
    #[instrument(skip(self, reason), fields(subsystem = "workflow", op = "cancel", handover_id = id))]
    pub async fn cancel(
        &self,
        caller: &Caller,
        id: i64,
        reason: Option<String>,
    ) -> Result<HandoverRecord> {
        let record = self.store.get(id).await?;
        if !record.is_party(caller.user_id) {
            return Err(Error::Unauthorized(
                "only the requester or responder may cancel".to_string(),
            ));
        }

        let updated = self
            .store
            .apply_transition(id, HandoverAction::Cancel, TransitionPatch::with_reason(reason))
            .await?;
        info!(
            subsystem = "workflow",
            handover_id = id,
            user_id = caller.user_id,
            status = %updated.status,
            "Handover canceled"
        );
        self.notifier.handover_canceled(&updated, caller.user_id).await;
        Ok(updated)
    }

    /// Single record by id.
    pub async fn get(&self, id: i64) -> Result<HandoverRecord> {
        self.store.get(id).await
    }

    /// Records where the caller is the requester, newest first.
    pub async fn my_requests(&self, caller: &Caller) -> Result<Vec<HandoverRecord>> {
        self.store.list_by_requester(caller.user_id).await
    }

    /// Records where the caller is the responder, newest first.
    pub async fn my_responses(&self, caller: &Caller) -> Result<Vec<HandoverRecord>> {
        self.store.list_by_responder(caller.user_id).await
    }

    /// One page of all records plus the total count.
    pub async fn list(&self, limit: usize, offset: usize) -> Result<(Vec<HandoverRecord>, usize)> {
        self.store.list_paged(limit, offset).await
    }

    /// Count of completed records, optionally restricted to a completion
    /// window (inclusive start, exclusive end).
    pub async fn count_completed(
        &self,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<u64> {
        self.store.count_completed(window).await
    }
}
