//! Handover state machine.
//!
//! [`next_status`] is the single source of truth for which movements between
//! [`HandoverStatus`] values are legal. Workflow-level guards that need more
//! than the current status (caller identity, security-review category) live
//! in the workflow crate; everything that can be decided from
//! `(current, action)` alone is decided here.
//!
//! Stores re-derive the next status through this table inside their write
//! path, so a transition raced by another writer fails with the same denial
//! message a plain illegal call would get.

use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::models::{HandoverRecord, HandoverStatus};

/// A requested movement of one handover record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoverAction {
    Accept,
    Reject,
    Verify,
    Approve,
    Schedule,
    Complete,
    Cancel,
}

impl std::fmt::Display for HandoverAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Reject => write!(f, "reject"),
            Self::Verify => write!(f, "verify"),
            Self::Approve => write!(f, "approve"),
            Self::Schedule => write!(f, "schedule"),
            Self::Complete => write!(f, "complete"),
            Self::Cancel => write!(f, "cancel"),
        }
    }
}

/// The status an action moves a record into, or `None` when the action is
/// illegal from the current status.
pub fn next_status(current: HandoverStatus, action: HandoverAction) -> Option<HandoverStatus> {
    use HandoverAction as A;
    use HandoverStatus as S;
    match (current, action) {
        (S::Requested, A::Accept) => Some(S::AcceptedByFinder),
        (S::Requested, A::Reject) => Some(S::Rejected),
        (S::AcceptedByFinder, A::Verify) => Some(S::VerifiedBySecurity),
        (S::AcceptedByFinder, A::Approve) => Some(S::ApprovedByOffice),
        (S::VerifiedBySecurity, A::Approve) => Some(S::ApprovedByOffice),
        (S::ApprovedByOffice, A::Schedule) => Some(S::Scheduled),
        (S::Scheduled, A::Complete) => Some(S::Completed),
        (current, A::Cancel) if !current.is_terminal() => Some(S::Canceled),
        _ => None,
    }
}

/// The error returned for an illegal `(current, action)` pair. Names the
/// current status so callers can see which guard fired.
pub fn transition_denied(current: HandoverStatus, action: HandoverAction) -> Error {
    Error::InvalidTransition(format!(
        "cannot {}: current status is {}",
        action, current
    ))
}

/// Field updates that accompany a transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionPatch {
    pub schedule_at: Option<DateTime<Utc>>,
    pub meet_place: Option<String>,
    pub cancel_reason: Option<String>,
}

impl TransitionPatch {
    /// Patch for transitions that carry no extra fields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Patch carrying the meeting details of a schedule transition.
    pub fn scheduled(schedule_at: DateTime<Utc>, meet_place: Option<String>) -> Self {
        Self {
            schedule_at: Some(schedule_at),
            meet_place,
            cancel_reason: None,
        }
    }

    /// Patch carrying the free-text reason of a reject or cancel transition.
    pub fn with_reason(reason: Option<String>) -> Self {
        Self {
            schedule_at: None,
            meet_place: None,
            cancel_reason: reason,
        }
    }
}

impl HandoverRecord {
    /// Applies `action` to this record, mutating status, per-status
    /// timestamps, and patch fields. Fails without mutating anything when
    /// the action is illegal from the current status.
    pub fn apply(
        &mut self,
        action: HandoverAction,
        patch: &TransitionPatch,
        now: DateTime<Utc>,
    ) -> crate::error::Result<()> {
        let next = next_status(self.status, action).ok_or_else(|| {
            transition_denied(self.status, action)
        })?;

        match action {
            HandoverAction::Accept => {
                self.accepted_by_finder_at.get_or_insert(now);
            }
            HandoverAction::Reject => {
                self.canceled_at.get_or_insert(now);
                self.cancel_reason = patch.cancel_reason.clone();
            }
            HandoverAction::Verify => {
                self.verified_by_security_at.get_or_insert(now);
            }
            HandoverAction::Approve => {
                self.approved_by_office_at.get_or_insert(now);
                self.contact_disclosed = true;
            }
            HandoverAction::Schedule => {
                self.schedule_at = patch.schedule_at;
                self.meet_place = patch.meet_place.clone();
            }
            HandoverAction::Complete => {
                self.completed_at.get_or_insert(now);
            }
            HandoverAction::Cancel => {
                self.canceled_at.get_or_insert(now);
                self.cancel_reason = patch.cancel_reason.clone();
            }
        }

        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HandoverMethod;

    const ALL_STATUSES: [HandoverStatus; 8] = [
        HandoverStatus::Requested,
        HandoverStatus::AcceptedByFinder,
        HandoverStatus::VerifiedBySecurity,
        HandoverStatus::ApprovedByOffice,
        HandoverStatus::Scheduled,
        HandoverStatus::Completed,
        HandoverStatus::Canceled,
        HandoverStatus::Rejected,
    ];

    const ALL_ACTIONS: [HandoverAction; 7] = [
        HandoverAction::Accept,
        HandoverAction::Reject,
        HandoverAction::Verify,
        HandoverAction::Approve,
        HandoverAction::Schedule,
        HandoverAction::Complete,
        HandoverAction::Cancel,
    ];

    fn record_in(status: HandoverStatus) -> HandoverRecord {
        let now = Utc::now();
        HandoverRecord {
            id: 1,
            lost_id: 2,
            found_id: 3,
            requester_id: 10,
            responder_id: 20,
            method: HandoverMethod::Meet,
            status,
            schedule_at: None,
            meet_place: None,
            accepted_by_finder_at: None,
            verified_by_security_at: None,
            approved_by_office_at: None,
            completed_at: None,
            canceled_at: None,
            cancel_reason: None,
            contact_disclosed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn happy_path_with_security_review() {
        let path = [
            (HandoverStatus::Requested, HandoverAction::Accept),
            (HandoverStatus::AcceptedByFinder, HandoverAction::Verify),
            (HandoverStatus::VerifiedBySecurity, HandoverAction::Approve),
            (HandoverStatus::ApprovedByOffice, HandoverAction::Schedule),
            (HandoverStatus::Scheduled, HandoverAction::Complete),
        ];
        let mut current = HandoverStatus::Requested;
        for (expected_from, action) in path {
            assert_eq!(current, expected_from);
            current = next_status(current, action).unwrap();
        }
        assert_eq!(current, HandoverStatus::Completed);
    }

    #[test]
    fn approve_skips_security_step() {
        assert_eq!(
            next_status(HandoverStatus::AcceptedByFinder, HandoverAction::Approve),
            Some(HandoverStatus::ApprovedByOffice)
        );
    }

    #[test]
    fn reject_only_from_requested() {
        assert_eq!(
            next_status(HandoverStatus::Requested, HandoverAction::Reject),
            Some(HandoverStatus::Rejected)
        );
        for status in ALL_STATUSES {
            if status != HandoverStatus::Requested {
                assert_eq!(next_status(status, HandoverAction::Reject), None);
            }
        }
    }

    #[test]
    fn cancel_from_every_non_terminal_status() {
        for status in ALL_STATUSES {
            let next = next_status(status, HandoverAction::Cancel);
            if status.is_terminal() {
                assert_eq!(next, None, "cancel must be denied from {}", status);
            } else {
                assert_eq!(next, Some(HandoverStatus::Canceled));
            }
        }
    }

    #[test]
    fn terminal_statuses_admit_no_action() {
        for status in [
            HandoverStatus::Completed,
            HandoverStatus::Canceled,
            HandoverStatus::Rejected,
        ] {
            for action in ALL_ACTIONS {
                assert_eq!(
                    next_status(status, action),
                    None,
                    "{} from {} must be denied",
                    action,
                    status
                );
            }
        }
    }

    #[test]
    fn complete_requires_scheduled() {
        for status in ALL_STATUSES {
            if status != HandoverStatus::Scheduled {
                assert_eq!(next_status(status, HandoverAction::Complete), None);
            }
        }
    }

    #[test]
    fn schedule_requires_office_approval() {
        for status in ALL_STATUSES {
            if status != HandoverStatus::ApprovedByOffice {
                assert_eq!(next_status(status, HandoverAction::Schedule), None);
            }
        }
    }

    #[test]
    fn verify_requires_finder_acceptance() {
        for status in ALL_STATUSES {
            if status != HandoverStatus::AcceptedByFinder {
                assert_eq!(next_status(status, HandoverAction::Verify), None);
            }
        }
    }

    #[test]
    fn denial_names_action_and_current_status() {
        let err = transition_denied(HandoverStatus::Requested, HandoverAction::Verify);
        assert_eq!(
            err.to_string(),
            "Invalid transition: cannot verify: current status is REQUESTED"
        );
    }

    #[test]
    fn apply_accept_stamps_timestamp() {
        let mut record = record_in(HandoverStatus::Requested);
        let now = Utc::now();
        record
            .apply(HandoverAction::Accept, &TransitionPatch::empty(), now)
            .unwrap();
        assert_eq!(record.status, HandoverStatus::AcceptedByFinder);
        assert_eq!(record.accepted_by_finder_at, Some(now));
        assert_eq!(record.updated_at, now);
    }

    #[test]
    fn apply_illegal_action_leaves_record_untouched() {
        let mut record = record_in(HandoverStatus::Requested);
        let before = record.clone();
        let err = record
            .apply(HandoverAction::Complete, &TransitionPatch::empty(), Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("cannot complete"));
        assert_eq!(record.status, before.status);
        assert_eq!(record.completed_at, None);
        assert_eq!(record.updated_at, before.updated_at);
    }

    #[test]
    fn apply_approve_discloses_contact_permanently() {
        let mut record = record_in(HandoverStatus::AcceptedByFinder);
        record
            .apply(HandoverAction::Approve, &TransitionPatch::empty(), Utc::now())
            .unwrap();
        assert!(record.contact_disclosed);
        assert!(record.approved_by_office_at.is_some());

        let schedule_at = Utc::now();
        record
            .apply(
                HandoverAction::Schedule,
                &TransitionPatch::scheduled(schedule_at, Some("Front desk".to_string())),
                Utc::now(),
            )
            .unwrap();
        assert!(record.contact_disclosed);
        assert_eq!(record.schedule_at, Some(schedule_at));
        assert_eq!(record.meet_place.as_deref(), Some("Front desk"));
    }

    #[test]
    fn apply_cancel_records_reason() {
        let mut record = record_in(HandoverStatus::Scheduled);
        let now = Utc::now();
        record
            .apply(
                HandoverAction::Cancel,
                &TransitionPatch::with_reason(Some("found my own".to_string())),
                now,
            )
            .unwrap();
        assert_eq!(record.status, HandoverStatus::Canceled);
        assert_eq!(record.canceled_at, Some(now));
        assert_eq!(record.cancel_reason.as_deref(), Some("found my own"));
    }

    #[test]
    fn apply_reject_stamps_reason_and_cancel_timestamp() {
        let mut record = record_in(HandoverStatus::Requested);
        let now = Utc::now();
        record
            .apply(
                HandoverAction::Reject,
                &TransitionPatch::with_reason(Some("not the right owner".to_string())),
                now,
            )
            .unwrap();
        assert_eq!(record.status, HandoverStatus::Rejected);
        assert_eq!(record.cancel_reason.as_deref(), Some("not the right owner"));
        assert_eq!(record.canceled_at, Some(now));
    }

    #[test]
    fn apply_after_terminal_fails() {
        let mut record = record_in(HandoverStatus::Requested);
        record
            .apply(
                HandoverAction::Cancel,
                &TransitionPatch::with_reason(None),
                Utc::now(),
            )
            .unwrap();
        let err = record
            .apply(HandoverAction::Accept, &TransitionPatch::empty(), Utc::now())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid transition: cannot accept: current status is CANCELED"
        );
    }
}
