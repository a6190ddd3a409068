//! Complaint status machine.
//!
//! - **Transition table**: the single source of truth for which role may
//!   move a complaint between which statuses
//! - **Application**: validates a request against the table and produces
//!   the updated complaint, or an error with nothing changed

mod machine;

pub use machine::{
    apply_transition, can_transition, check_transition, rule_for, TransitionKind, TransitionRule,
    TRANSITIONS,
};
