//! Transition audit trail.
//!
//! Every applied status change is appended to the complaint it affects, so
//! a resident looking up a tracking number can see who moved it and when.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::types::{Actor, ComplaintStatus, StaffRole};

/// One applied status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct StatusChange {
    pub from: ComplaintStatus,
    pub to: ComplaintStatus,
    /// Role that performed the change
    pub role: StaffRole,
    /// Staff identity, when the caller supplied one
    pub staff_id: Option<String>,
    pub at: DateTime<Utc>,
    /// Resolution note, rejection reason or closure note
    pub note: Option<String>,
}

impl StatusChange {
    pub(crate) fn new(
        from: ComplaintStatus,
        to: ComplaintStatus,
        actor: &Actor,
        at: DateTime<Utc>,
        note: Option<String>,
    ) -> Self {
        Self {
            from,
            to,
            role: actor.role,
            staff_id: actor.staff_id.clone(),
            at,
            note,
        }
    }
}

/// Check that a history is a connected walk starting at the initial status.
pub fn is_connected_walk(history: &[StatusChange]) -> bool {
    let mut current = ComplaintStatus::INITIAL;
    for change in history {
        if change.from != current {
            return false;
        }
        current = change.to;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(from: ComplaintStatus, to: ComplaintStatus) -> StatusChange {
        StatusChange::new(from, to, &Actor::new(StaffRole::Admin), Utc::now(), None)
    }

    #[test]
    fn test_connected_walk() {
        let history = vec![
            change(ComplaintStatus::Unread, ComplaintStatus::InProgress),
            change(ComplaintStatus::InProgress, ComplaintStatus::Completed),
        ];
        assert!(is_connected_walk(&history));
        assert!(is_connected_walk(&[]));
    }

    #[test]
    fn test_disconnected_walk() {
        let history = vec![change(ComplaintStatus::InProgress, ComplaintStatus::Closed)];
        assert!(!is_connected_walk(&history));
    }

    #[test]
    fn test_actor_is_recorded() {
        let actor = Actor::new(StaffRole::Muktar).with_staff_id("muk-7");
        let entry = StatusChange::new(
            ComplaintStatus::Unread,
            ComplaintStatus::Rejected,
            &actor,
            Utc::now(),
            Some("duplicate".to_string()),
        );
        assert_eq!(entry.role, StaffRole::Muktar);
        assert_eq!(entry.staff_id.as_deref(), Some("muk-7"));
    }
}
