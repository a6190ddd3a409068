//! Transition table and application.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::history::StatusChange;
use crate::types::{
    Actor, Complaint, ComplaintStatus, EngineError, RequiredField, Result, StaffRole,
    TransitionMetadata,
};

const ALL_STAFF: &[StaffRole] = &[StaffRole::Muktar, StaffRole::Admin, StaffRole::Manager];
const SUPERVISORS: &[StaffRole] = &[StaffRole::Admin, StaffRole::Manager];

/// What a transition means to the people involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Staff picks the complaint up
    Accept,
    /// Staff declines the complaint before work starts
    Reject,
    /// Work finished
    Complete,
    /// Administrative closure of work in progress
    Close,
}

/// One edge of the status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: ComplaintStatus,
    pub to: ComplaintStatus,
    pub kind: TransitionKind,
    /// Roles allowed to trigger this edge
    pub roles: &'static [StaffRole],
    /// Metadata that must be present and non-blank
    pub requires: Option<RequiredField>,
}

impl TransitionRule {
    /// Check if a role may trigger this edge.
    pub fn permits(&self, role: StaffRole) -> bool {
        self.roles.contains(&role)
    }
}

/// Every edge of the status machine. Terminal statuses have none.
pub const TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        from: ComplaintStatus::Unread,
        to: ComplaintStatus::InProgress,
        kind: TransitionKind::Accept,
        roles: ALL_STAFF,
        requires: None,
    },
    TransitionRule {
        from: ComplaintStatus::Unread,
        to: ComplaintStatus::Rejected,
        kind: TransitionKind::Reject,
        roles: ALL_STAFF,
        requires: Some(RequiredField::RejectionReason),
    },
    TransitionRule {
        from: ComplaintStatus::InProgress,
        to: ComplaintStatus::Completed,
        kind: TransitionKind::Complete,
        roles: ALL_STAFF,
        requires: Some(RequiredField::ResolutionNote),
    },
    TransitionRule {
        from: ComplaintStatus::InProgress,
        to: ComplaintStatus::Closed,
        kind: TransitionKind::Close,
        roles: SUPERVISORS,
        requires: Some(RequiredField::RejectionReason),
    },
];

/// Look up the edge between two statuses.
pub fn rule_for(from: ComplaintStatus, to: ComplaintStatus) -> Option<&'static TransitionRule> {
    TRANSITIONS.iter().find(|r| r.from == from && r.to == to)
}

/// Check if `role` may move a complaint from `current` to `target`.
pub fn can_transition(current: ComplaintStatus, target: ComplaintStatus, role: StaffRole) -> bool {
    rule_for(current, target).is_some_and(|rule| rule.permits(role))
}

/// Validate a transition request without applying it.
///
/// Authorization is decided per edge, so a request naming an edge that does
/// not exist (self-transitions, exits from terminal statuses, skips) is an
/// `InvalidTransition` for every role. For an existing edge the role is
/// checked before the required metadata.
pub fn check_transition(
    current: ComplaintStatus,
    target: ComplaintStatus,
    role: StaffRole,
    metadata: &TransitionMetadata,
) -> Result<&'static TransitionRule> {
    let rule = rule_for(current, target).ok_or(EngineError::InvalidTransition {
        from: current,
        to: target,
    })?;

    if !rule.permits(role) {
        return Err(EngineError::Unauthorized {
            role,
            from: current,
            to: target,
        });
    }

    if let Some(field) = rule.requires {
        if required_value(field, metadata).is_none() {
            return Err(EngineError::MissingRequiredField(field));
        }
    }

    Ok(rule)
}

/// Apply a transition, returning the updated complaint.
///
/// The input complaint is never modified; on error nothing changes.
pub fn apply_transition(
    complaint: &Complaint,
    target: ComplaintStatus,
    actor: &Actor,
    metadata: &TransitionMetadata,
    at: DateTime<Utc>,
) -> Result<Complaint> {
    let current = complaint.status();
    let rule = check_transition(current, target, actor.role, metadata)?;

    let note = rule.requires.and_then(|field| required_value(field, metadata));
    let (resolution_note, rejection_reason) = match rule.requires {
        Some(RequiredField::ResolutionNote) => (note.clone(), None),
        Some(RequiredField::RejectionReason) => (None, note.clone()),
        None => (None, None),
    };

    let mut updated = complaint.clone();
    updated.record_transition(
        StatusChange::new(current, target, actor, at, note),
        resolution_note,
        rejection_reason,
    );

    debug!(
        complaint_id = %complaint.id(),
        kind = ?rule.kind,
        from = %current,
        to = %target,
        role = %actor.role,
        "Transition applied"
    );

    Ok(updated)
}

fn required_value(field: RequiredField, metadata: &TransitionMetadata) -> Option<String> {
    let value = match field {
        RequiredField::ResolutionNote => metadata.resolution_note.as_deref(),
        RequiredField::RejectionReason => metadata.rejection_reason.as_deref(),
    };
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
