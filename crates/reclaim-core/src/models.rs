//! Core data models for the reclaim handover coordinator.
//!
//! These types are shared across all reclaim crates and represent the
//! authoritative handover record, the advisory match candidate cache, and the
//! read-only projections of collaborator-owned item records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// HANDOVER TYPES
// =============================================================================

/// Status of a handover attempt.
///
/// The happy path runs `Requested` to `Completed`; `VerifiedBySecurity` is
/// only visited for categories that require a security review. `Rejected`
/// and `Canceled` are terminal side-branches. Legal movements between
/// statuses are defined by [`crate::transitions::next_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandoverStatus {
    Requested,
    AcceptedByFinder,
    VerifiedBySecurity,
    ApprovedByOffice,
    Scheduled,
    Completed,
    Canceled,
    Rejected,
}

impl HandoverStatus {
    /// Terminal statuses are immutable; no further transition may apply.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Rejected)
    }
}

impl std::fmt::Display for HandoverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requested => write!(f, "REQUESTED"),
            Self::AcceptedByFinder => write!(f, "ACCEPTED_BY_FINDER"),
            Self::VerifiedBySecurity => write!(f, "VERIFIED_BY_SECURITY"),
            Self::ApprovedByOffice => write!(f, "APPROVED_BY_OFFICE"),
            Self::Scheduled => write!(f, "SCHEDULED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl std::str::FromStr for HandoverStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "REQUESTED" => Ok(Self::Requested),
            "ACCEPTED_BY_FINDER" => Ok(Self::AcceptedByFinder),
            "VERIFIED_BY_SECURITY" => Ok(Self::VerifiedBySecurity),
            "APPROVED_BY_OFFICE" => Ok(Self::ApprovedByOffice),
            "SCHEDULED" => Ok(Self::Scheduled),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELED" => Ok(Self::Canceled),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(format!("Invalid handover status: {}", s)),
        }
    }
}

/// How the physical item changes hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandoverMethod {
    /// In-person meetup at an agreed place.
    Meet,
    /// Postal mail.
    Mail,
    /// Third-party courier pickup.
    Courier,
}

impl std::fmt::Display for HandoverMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Meet => write!(f, "MEET"),
            Self::Mail => write!(f, "MAIL"),
            Self::Courier => write!(f, "COURIER"),
        }
    }
}

impl std::str::FromStr for HandoverMethod {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MEET" => Ok(Self::Meet),
            "MAIL" => Ok(Self::Mail),
            "COURIER" => Ok(Self::Courier),
            _ => Err(format!("Invalid handover method: {}", s)),
        }
    }
}

/// One handover attempt between a requester (lost-item reporter) and a
/// responder (found-item holder). Never deleted; terminal statuses freeze
/// the record for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoverRecord {
    pub id: i64,
    pub lost_id: i64,
    pub found_id: i64,
    pub requester_id: i64,
    /// Owner of the found record. Resolved from the found-record service at
    /// creation time, never taken from caller input.
    pub responder_id: i64,
    pub method: HandoverMethod,
    pub status: HandoverStatus,
    pub schedule_at: Option<DateTime<Utc>>,
    pub meet_place: Option<String>,
    pub accepted_by_finder_at: Option<DateTime<Utc>>,
    pub verified_by_security_at: Option<DateTime<Utc>>,
    pub approved_by_office_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    /// True from the first ApprovedByOffice transition onward, never reverts.
    pub contact_disclosed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HandoverRecord {
    /// Whether the given user is the requester or the responder.
    pub fn is_party(&self, user_id: i64) -> bool {
        self.requester_id == user_id || self.responder_id == user_id
    }

    /// The other party relative to `user_id`. Callers must check
    /// [`Self::is_party`] first; a non-party input returns the requester.
    pub fn counterparty_of(&self, user_id: i64) -> i64 {
        if self.requester_id == user_id {
            self.responder_id
        } else {
            self.requester_id
        }
    }
}

/// Input for inserting a new handover record.
#[derive(Debug, Clone)]
pub struct NewHandover {
    pub lost_id: i64,
    pub found_id: i64,
    pub requester_id: i64,
    pub responder_id: i64,
    pub method: HandoverMethod,
    pub schedule_at: Option<DateTime<Utc>>,
    pub meet_place: Option<String>,
}

/// Request body for `POST /handovers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHandoverRequest {
    pub lost_id: i64,
    pub found_id: i64,
    pub method: HandoverMethod,
    #[serde(default)]
    pub schedule_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meet_place: Option<String>,
}

/// Request body carrying a free-text reason (reject, cancel).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for `POST /handovers/{id}/schedule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub schedule_at: DateTime<Utc>,
    #[serde(default)]
    pub meet_place: Option<String>,
}

// =============================================================================
// MATCHING TYPES
// =============================================================================

/// Cached compatibility score for one (lost, found) pair.
///
/// Advisory only: a handover can be created for a pair that was never
/// scored, and rescoring overwrites score/reason in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub id: i64,
    pub lost_id: i64,
    pub found_id: i64,
    pub score: i32,
    /// Human-readable signal decomposition, signals joined with `", "`.
    pub reason: String,
    /// Whether the requester has seen this candidate. Set on insert,
    /// preserved across rescoring.
    pub viewed: bool,
    pub created_at: DateTime<Utc>,
}

/// One ranked entry returned by the matching queries, with both item views
/// embedded so callers need no follow-up lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub lost_id: i64,
    pub found_id: i64,
    pub score: i32,
    pub reason: String,
    pub lost_item: LostRecordView,
    pub found_item: FoundRecordView,
}

// =============================================================================
// COLLABORATOR ITEM VIEWS
// =============================================================================

/// Categories whose handover requires an extra security review step.
pub const SECURITY_REVIEW_CATEGORIES: [&str; 3] = ["ELECTRONICS", "WALLET", "ID_CARD"];

/// Whether a category identifier is in the security-review set.
pub fn requires_security_review(category: &str) -> bool {
    SECURITY_REVIEW_CATEGORIES.contains(&category)
}

/// Read-only projection of a lost-item record served by the lost-record
/// collaborator. Never persisted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LostRecordView {
    pub id: i64,
    /// Reporting owner of the lost item.
    #[serde(default)]
    pub user_id: i64,
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub lost_at: Option<DateTime<Utc>>,
    pub lost_place: Option<String>,
    pub status: Option<String>,
}

/// Read-only projection of a found-item record served by the found-record
/// collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundRecordView {
    pub id: i64,
    /// Holder of the found item; becomes the handover responder.
    #[serde(default)]
    pub owner_user_id: i64,
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub found_at: Option<DateTime<Utc>>,
    pub found_place: Option<String>,
    pub status: Option<String>,
    /// Served by newer found-service versions; older ones omit it and the
    /// flag is derived from the category instead.
    pub requires_security_check: Option<bool>,
}

impl FoundRecordView {
    /// Whether this item needs the security review step before office
    /// approval. Prefers the collaborator-served flag, falls back to the
    /// category rule.
    pub fn security_review_required(&self) -> bool {
        match self.requires_security_check {
            Some(flag) => flag,
            None => self
                .category
                .as_deref()
                .map(requires_security_review)
                .unwrap_or(false),
        }
    }
}

// =============================================================================
// CALLER IDENTITY
// =============================================================================

/// Role of an authenticated user, issued by the user directory and relayed
/// by the gateway in request metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Loser,
    Finder,
    Office,
    Security,
    Admin,
    Courier,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loser => write!(f, "LOSER"),
            Self::Finder => write!(f, "FINDER"),
            Self::Office => write!(f, "OFFICE"),
            Self::Security => write!(f, "SECURITY"),
            Self::Admin => write!(f, "ADMIN"),
            Self::Courier => write!(f, "COURIER"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOSER" => Ok(Self::Loser),
            "FINDER" => Ok(Self::Finder),
            "OFFICE" => Ok(Self::Office),
            "SECURITY" => Ok(Self::Security),
            "ADMIN" => Ok(Self::Admin),
            "COURIER" => Ok(Self::Courier),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Caller identity threaded explicitly through every operation.
///
/// The values come from trusted gateway headers; this service checks
/// presence and party/role membership but performs no re-authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub role: Option<Role>,
}

impl Caller {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            role: None,
        }
    }

    pub fn with_role(user_id: i64, role: Role) -> Self {
        Self {
            user_id,
            role: Some(role),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}

// =============================================================================
// NOTIFICATION TYPES
// =============================================================================

/// Kind of a dispatched notification, keyed to a workflow event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    HandoverRequested,
    HandoverAccepted,
    HandoverRejected,
    SecurityCheckRequired,
    HandoverVerified,
    HandoverApproved,
    HandoverScheduled,
    HandoverCompleted,
    HandoverCanceled,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HandoverRequested => write!(f, "HANDOVER_REQUESTED"),
            Self::HandoverAccepted => write!(f, "HANDOVER_ACCEPTED"),
            Self::HandoverRejected => write!(f, "HANDOVER_REJECTED"),
            Self::SecurityCheckRequired => write!(f, "SECURITY_CHECK_REQUIRED"),
            Self::HandoverVerified => write!(f, "HANDOVER_VERIFIED"),
            Self::HandoverApproved => write!(f, "HANDOVER_APPROVED"),
            Self::HandoverScheduled => write!(f, "HANDOVER_SCHEDULED"),
            Self::HandoverCompleted => write!(f, "HANDOVER_COMPLETED"),
            Self::HandoverCanceled => write!(f, "HANDOVER_CANCELED"),
        }
    }
}

/// Payload for `POST /notifications` on the notification collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_handover_id: Option<i64>,
}
