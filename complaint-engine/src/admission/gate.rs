//! The admission gate.
//!
//! The per-contact lock is held only for the duration of a check or a
//! commit, never across the caller's work in between. A commit re-reads the
//! window under the lock, so of several permits issued for one contact only
//! the first to commit wins.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::window::{evaluate, AdmissionDecision, AdmissionWindow};
use crate::locks::KeyedLocks;
use crate::store::{AdmissionWindowStore, StoreError};

/// Result of `check_and_reserve`.
#[derive(Debug)]
pub enum Admission {
    /// Submission may proceed; commit the permit once it is ready to record
    Allowed(AdmissionPermit),
    /// Contact is still cooling down
    Denied { remaining: Duration },
}

/// Result of committing a permit.
#[derive(Debug)]
pub enum CommitOutcome {
    /// Window stamped; the handle can undo it if later work fails
    Committed(CommittedAdmission),
    /// Another submission from the contact committed after this permit was
    /// issued
    Superseded { remaining: Duration },
}

/// Permission to stamp a contact's window, issued by a successful check.
///
/// Holds no lock. Dropping it without committing leaves the window
/// untouched.
pub struct AdmissionPermit {
    contact: String,
    gate: GateHandle,
}

impl AdmissionPermit {
    pub fn contact(&self) -> &str {
        &self.contact
    }

    /// Stamp the window at `now` unless another submission got there first.
    pub async fn commit(self, now: DateTime<Utc>) -> Result<CommitOutcome, StoreError> {
        let _guard = self.gate.locks.acquire(&self.contact).await;
        let previous = self.gate.store.load(&self.contact).await?;

        if let AdmissionDecision::Denied { remaining } = evaluate(previous.as_ref(), now, self.gate.cooldown) {
            warn!(
                contact = %self.contact,
                remaining_secs = remaining.num_seconds(),
                "Admission superseded by a concurrent submission"
            );
            return Ok(CommitOutcome::Superseded { remaining });
        }

        let stamped = AdmissionWindow::new(now);
        self.gate.store.save(&self.contact, stamped).await?;
        debug!(contact = %self.contact, at = %now, "Admission window committed");

        Ok(CommitOutcome::Committed(CommittedAdmission {
            contact: self.contact,
            gate: self.gate,
            previous,
            stamped,
        }))
    }
}

impl fmt::Debug for AdmissionPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionPermit")
            .field("contact", &self.contact)
            .finish_non_exhaustive()
    }
}

/// A stamped window that can still be taken back.
pub struct CommittedAdmission {
    contact: String,
    gate: GateHandle,
    previous: Option<AdmissionWindow>,
    stamped: AdmissionWindow,
}

impl CommittedAdmission {
    /// Restore the window as it was before the commit.
    ///
    /// Does nothing if the window has moved on since.
    pub async fn revert(self) -> Result<(), StoreError> {
        let _guard = self.gate.locks.acquire(&self.contact).await;
        let current = self.gate.store.load(&self.contact).await?;
        if current != Some(self.stamped) {
            return Ok(());
        }

        match self.previous {
            Some(previous) => self.gate.store.save(&self.contact, previous).await?,
            None => self.gate.store.delete(&self.contact).await?,
        }
        debug!(contact = %self.contact, "Admission window reverted");
        Ok(())
    }
}

impl fmt::Debug for CommittedAdmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommittedAdmission")
            .field("contact", &self.contact)
            .field("stamped", &self.stamped)
            .finish_non_exhaustive()
    }
}

/// Shared state a permit needs to reach the store.
#[derive(Clone)]
struct GateHandle {
    store: Arc<dyn AdmissionWindowStore>,
    locks: KeyedLocks,
    cooldown: Duration,
}

/// Cooldown gate keyed by submitter contact.
pub struct AdmissionControl {
    gate: GateHandle,
}

impl AdmissionControl {
    /// Create a gate over a window store.
    pub fn new(store: Arc<dyn AdmissionWindowStore>, cooldown: Duration) -> Self {
        Self {
            gate: GateHandle {
                store,
                locks: KeyedLocks::new(),
                cooldown,
            },
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.gate.cooldown
    }

    /// Check a contact without issuing a permit.
    ///
    /// Advisory only: a concurrent submission may commit in between.
    pub async fn probe(&self, contact: &str, now: DateTime<Utc>) -> Result<AdmissionDecision, StoreError> {
        let window = self.gate.store.load(contact).await?;
        Ok(evaluate(window.as_ref(), now, self.gate.cooldown))
    }

    /// Check a contact and, if allowed, issue a permit to stamp its window.
    ///
    /// Checking again before any commit returns `Allowed` again; the
    /// window only changes when a permit is committed.
    pub async fn check_and_reserve(&self, contact: &str, now: DateTime<Utc>) -> Result<Admission, StoreError> {
        let window = {
            let _guard = self.gate.locks.acquire(contact).await;
            self.gate.store.load(contact).await?
        };

        match evaluate(window.as_ref(), now, self.gate.cooldown) {
            AdmissionDecision::Allowed => {
                debug!(contact = %contact, "Admission allowed");
                Ok(Admission::Allowed(AdmissionPermit {
                    contact: contact.to_string(),
                    gate: self.gate.clone(),
                }))
            }
            AdmissionDecision::Denied { remaining } => {
                warn!(
                    contact = %contact,
                    remaining_secs = remaining.num_seconds(),
                    "Admission denied, contact is cooling down"
                );
                Ok(Admission::Denied { remaining })
            }
        }
    }
}
