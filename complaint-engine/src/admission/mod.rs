//! Admission control for new submissions.
//!
//! An immediate accept/deny gate keyed by submitter contact. A contact may
//! not have two accepted submissions within the cooldown window. Denials
//! are advisory: callers render the remaining wait.

mod gate;
mod window;

pub use gate::{Admission, AdmissionControl, AdmissionPermit, CommitOutcome, CommittedAdmission};
pub use window::{evaluate, AdmissionDecision, AdmissionWindow};
