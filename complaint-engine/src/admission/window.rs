//! Admission windows and the cooldown decision.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Most recent accepted submission for one contact.
///
/// Overwritten on every accepted submission. Once the cooldown has elapsed
/// it simply stops denying; it is only removed when the submission that
/// first stamped it is undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionWindow {
    pub last_submission_at: DateTime<Utc>,
}

impl AdmissionWindow {
    pub fn new(last_submission_at: DateTime<Utc>) -> Self {
        Self { last_submission_at }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    Allowed,
    Denied { remaining: Duration },
}

impl AdmissionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allowed)
    }
}

/// Decide whether a submission at `now` is admitted.
///
/// A window stamped in the future counts as zero elapsed time, so the
/// remaining wait never exceeds the cooldown.
pub fn evaluate(window: Option<&AdmissionWindow>, now: DateTime<Utc>, cooldown: Duration) -> AdmissionDecision {
    let Some(window) = window else {
        return AdmissionDecision::Allowed;
    };

    let elapsed = (now - window.last_submission_at).max(Duration::zero());
    if elapsed >= cooldown {
        AdmissionDecision::Allowed
    } else {
        AdmissionDecision::Denied {
            remaining: cooldown - elapsed,
        }
    }
}
