//! Best-effort notification fan-out for handover lifecycle events.
//!
//! Every dispatch here is fire-and-forget: requests in a batch go out
//! concurrently, delivery failures are logged and swallowed, and no failure
//! ever propagates back into the transition that triggered it.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use reclaim_core::{
    HandoverRecord, NotificationKind, NotificationRequest, NotificationService, Role,
    UserDirectoryService,
};

/// Builds and dispatches lifecycle notifications.
///
/// Routing follows the workflow: the responder hears about new requests, the
/// requester hears about the finder's decision, security reviewers are fanned
/// out to when a sensitive category is accepted, and both parties hear about
/// everything from verification onward.
pub struct Notifier {
    notifications: Arc<dyn NotificationService>,
    users: Arc<dyn UserDirectoryService>,
}

impl Notifier {
    pub fn new(
        notifications: Arc<dyn NotificationService>,
        users: Arc<dyn UserDirectoryService>,
    ) -> Self {
        Self {
            notifications,
            users,
        }
    }

    /// `Requested`: tell the responder someone asked for their found item.
    pub async fn handover_requested(&self, record: &HandoverRecord) {
        self.dispatch(vec![request(
            record,
            record.responder_id,
            NotificationKind::HandoverRequested,
            "New handover request",
            format!("Handover #{} was requested for your found item.", record.id),
        )])
        .await;
    }

    /// `AcceptedByFinder`: tell the requester the finder agreed.
    pub async fn handover_accepted(&self, record: &HandoverRecord) {
        self.dispatch(vec![request(
            record,
            record.requester_id,
            NotificationKind::HandoverAccepted,
            "Handover accepted",
            format!("Handover #{} was accepted by the finder.", record.id),
        )])
        .await;
    }

    /// `Rejected`: tell the requester, including the finder's reason when
    /// one was given.
    pub async fn handover_rejected(&self, record: &HandoverRecord) {
        self.dispatch(vec![request(
            record,
            record.requester_id,
            NotificationKind::HandoverRejected,
            "Handover rejected",
            with_reason(
                &format!("Handover #{} was declined by the finder.", record.id),
                record.cancel_reason.as_deref(),
            ),
        )])
        .await;
    }

    /// Acceptance of a review-required category: fan out to every user
    /// holding the security role. An unreachable user directory skips the
    /// fan-out entirely rather than failing the acceptance.
    pub async fn security_check_required(&self, record: &HandoverRecord) {
        let reviewers = match self.users.ids_with_role(Role::Security).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(
                    subsystem = "workflow",
                    component = "notifier",
                    handover_id = record.id,
                    error = %e,
                    "Could not resolve security reviewers; skipping fan-out"
                );
                return;
            }
        };
        let content = format!(
            "Handover #{} is waiting for a security check before office approval.",
            record.id
        );
        let batch: Vec<NotificationRequest> = reviewers
            .into_iter()
            .map(|user_id| {
                request(
                    record,
                    user_id,
                    NotificationKind::SecurityCheckRequired,
                    "Security check required",
                    content.clone(),
                )
            })
            .collect();
        self.dispatch(batch).await;
    }

    /// `VerifiedBySecurity`: both parties.
    pub async fn handover_verified(&self, record: &HandoverRecord) {
        self.dispatch(to_both(
            record,
            NotificationKind::HandoverVerified,
            "Security check passed",
            format!("Handover #{} passed the security check.", record.id),
        ))
        .await;
    }

    /// `ApprovedByOffice`: both parties, contact details now shared.
    pub async fn handover_approved(&self, record: &HandoverRecord) {
        self.dispatch(to_both(
            record,
            NotificationKind::HandoverApproved,
            "Handover approved",
            format!(
                "Handover #{} was approved by the office. Contact details are now visible to both parties.",
                record.id
            ),
        ))
        .await;
    }

    /// `Scheduled`: both parties, with the confirmed time and meeting place.
    pub async fn handover_scheduled(&self, record: &HandoverRecord) {
        let mut content = match record.schedule_at {
            Some(at) => format!("Handover #{} was scheduled for {}.", record.id, at),
            None => format!("Handover #{} was scheduled.", record.id),
        };
        if let Some(place) = record.meet_place.as_deref() {
            content.push_str(&format!(" Meeting place: {}.", place));
        }
        self.dispatch(to_both(
            record,
            NotificationKind::HandoverScheduled,
            "Handover scheduled",
            content,
        ))
        .await;
    }

    /// `Completed`: both parties.
    pub async fn handover_completed(&self, record: &HandoverRecord) {
        self.dispatch(to_both(
            record,
            NotificationKind::HandoverCompleted,
            "Handover completed",
            format!("Handover #{} was completed. The item was handed over.", record.id),
        ))
        .await;
    }

    /// `Canceled`: only the party that did not cancel.
    pub async fn handover_canceled(&self, record: &HandoverRecord, canceled_by: i64) {
        self.dispatch(vec![request(
            record,
            record.counterparty_of(canceled_by),
            NotificationKind::HandoverCanceled,
            "Handover canceled",
            with_reason(
                &format!("Handover #{} was canceled by the other party.", record.id),
                record.cancel_reason.as_deref(),
            ),
        )])
        .await;
    }

    /// Sends one batch concurrently, swallowing per-request failures.
    async fn dispatch(&self, batch: Vec<NotificationRequest>) {
        if batch.is_empty() {
            return;
        }
        let notify_count = batch.len();
        let sends = batch.into_iter().map(|req| {
            let notifications = Arc::clone(&self.notifications);
            async move {
                let user_id = req.user_id;
                let kind = req.kind;
                if let Err(e) = notifications.send(req).await {
                    warn!(
                        subsystem = "workflow",
                        component = "notifier",
                        user_id,
                        kind = %kind,
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        });
        join_all(sends).await;
        debug!(
            subsystem = "workflow",
            component = "notifier",
            notify_count,
            "Dispatched notification batch"
        );
    }
}

fn request(
    record: &HandoverRecord,
    user_id: i64,
    kind: NotificationKind,
    title: &str,
    content: String,
) -> NotificationRequest {
    NotificationRequest {
        user_id,
        kind,
        title: title.to_string(),
        content,
        related_handover_id: Some(record.id),
    }
}

fn to_both(
    record: &HandoverRecord,
    kind: NotificationKind,
    title: &str,
    content: String,
) -> Vec<NotificationRequest> {
    vec![
        request(record, record.requester_id, kind, title, content.clone()),
        request(record, record.responder_id, kind, title, content),
    ]
}

fn with_reason(base: &str, reason: Option<&str>) -> String {
    match reason {
        Some(r) if !r.trim().is_empty() => format!("{} Reason: {}", base, r.trim()),
        _ => base.to_string(),
    }
}
