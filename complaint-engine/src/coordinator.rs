//! LifecycleCoordinator - the engine's entry point.
//!
//! Composes validation, admission control, routing and the status machine
//! into the operations the surrounding application calls: `submit` for
//! residents and `transition` for staff, plus the lookups that back public
//! tracking and staff queues.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::admission::{Admission, AdmissionControl, AdmissionDecision, CommitOutcome};
use crate::config::EngineConfig;
use crate::lifecycle::apply_transition;
use crate::locks::KeyedLocks;
use crate::routing::{Assignee, RoutingPolicy, StaffDirectory};
use crate::store::{
    AdmissionWindowStore, ComplaintStore, InMemoryAdmissionWindowStore, InMemoryComplaintStore,
};
use crate::tracking::TrackingNumberIssuer;
use crate::types::{
    Actor, Complaint, ComplaintStatus, District, EngineError, NewComplaint, Result, StaffRole,
    SubmissionInput, TrackingNumber, TransitionMetadata,
};
use crate::validation::validate_submission;

/// What a resident gets back from a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub complaint_id: String,
    pub tracking_number: TrackingNumber,
    pub assigned_role: StaffRole,
    pub assignee: Assignee,
    pub created_at: DateTime<Utc>,
}

/// Owns every write to complaints and admission windows.
pub struct LifecycleCoordinator {
    /// Configuration
    config: EngineConfig,
    /// Urgency-based routing
    routing: RoutingPolicy,
    /// Cooldown gate
    admission: AdmissionControl,
    /// Staff registry snapshot
    directory: Arc<dyn StaffDirectory>,
    /// Complaint persistence
    complaints: Arc<dyn ComplaintStore>,
    /// Serializes transitions per complaint id
    complaint_locks: KeyedLocks,
    /// Tracking number source
    tracking: TrackingNumberIssuer,
}

impl LifecycleCoordinator {
    /// Create a coordinator over external stores.
    pub fn new(
        config: EngineConfig,
        directory: Arc<dyn StaffDirectory>,
        complaints: Arc<dyn ComplaintStore>,
        windows: Arc<dyn AdmissionWindowStore>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            routing: RoutingPolicy::new(config.routing.clone()),
            admission: AdmissionControl::new(windows, config.admission.cooldown()),
            tracking: TrackingNumberIssuer::new(config.tracking.prefix.clone()),
            directory,
            complaints,
            complaint_locks: KeyedLocks::new(),
            config,
        })
    }

    /// Create a coordinator backed by in-memory stores.
    pub fn in_memory(config: EngineConfig, directory: Arc<dyn StaffDirectory>) -> Result<Self> {
        Self::new(
            config,
            directory,
            Arc::new(InMemoryComplaintStore::new()),
            Arc::new(InMemoryAdmissionWindowStore::new()),
        )
    }

    /// Builder: replace the tracking number issuer.
    pub fn with_tracking_issuer(mut self, issuer: TrackingNumberIssuer) -> Self {
        self.tracking = issuer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// File a complaint now.
    pub async fn submit(&self, input: SubmissionInput) -> Result<SubmissionReceipt> {
        self.submit_at(input, Utc::now()).await
    }

    /// File a complaint at a given time.
    ///
    /// Either the complaint is stored and the submitter's window stamped, or
    /// neither happens. The window is stamped first so a complaint is never
    /// visible before its submission has been admitted.
    pub async fn submit_at(&self, input: SubmissionInput, now: DateTime<Utc>) -> Result<SubmissionReceipt> {
        let submission = validate_submission(&input, &self.config.intake)?;

        let permit = match self
            .admission
            .check_and_reserve(submission.submitter_contact(), now)
            .await?
        {
            Admission::Allowed(permit) => permit,
            Admission::Denied { remaining } => return Err(EngineError::RateLimited { remaining }),
        };

        let assignment = self
            .routing
            .route(submission.urgency, &submission.district, self.directory.as_ref());

        let complaint = Complaint::create(NewComplaint {
            id: uuid::Uuid::new_v4().to_string(),
            tracking_number: self.tracking.issue(),
            district: submission.district,
            category: submission.category,
            urgency: submission.urgency,
            title: submission.title,
            description: submission.description,
            help_offer: submission.help_offer,
            submitter_contact: submission.phone,
            assigned_role: assignment.role,
            assigned_district: assignment.district,
            assignee: assignment.assignee,
            created_at: now,
        });

        let committed = match permit.commit(now).await? {
            CommitOutcome::Committed(committed) => committed,
            CommitOutcome::Superseded { remaining } => return Err(EngineError::RateLimited { remaining }),
        };

        if let Err(cause) = self.complaints.save(&complaint).await {
            warn!(
                complaint_id = %complaint.id(),
                error = %cause,
                "Storing complaint failed, reverting admission window"
            );
            if let Err(rollback) = committed.revert().await {
                error!(
                    complaint_id = %complaint.id(),
                    error = %rollback,
                    "Reverting admission window failed"
                );
                return Err(EngineError::RollbackFailed { cause, rollback });
            }
            return Err(cause.into());
        }

        info!(
            complaint_id = %complaint.id(),
            tracking_number = %complaint.tracking_number(),
            urgency = %complaint.urgency(),
            district = %complaint.district(),
            assigned_role = %complaint.assigned_role(),
            assignee = %complaint.assignee().label(),
            "Complaint submitted"
        );

        Ok(SubmissionReceipt {
            complaint_id: complaint.id().to_string(),
            tracking_number: complaint.tracking_number().clone(),
            assigned_role: complaint.assigned_role(),
            assignee: complaint.assignee().clone(),
            created_at: now,
        })
    }

    /// Move a complaint to a new status now.
    pub async fn transition(
        &self,
        complaint_id: &str,
        target: ComplaintStatus,
        actor: &Actor,
        metadata: TransitionMetadata,
    ) -> Result<Complaint> {
        self.transition_at(complaint_id, target, actor, metadata, Utc::now())
            .await
    }

    /// Move a complaint to a new status at a given time.
    pub async fn transition_at(
        &self,
        complaint_id: &str,
        target: ComplaintStatus,
        actor: &Actor,
        metadata: TransitionMetadata,
        at: DateTime<Utc>,
    ) -> Result<Complaint> {
        let _guard = self.complaint_locks.acquire(complaint_id).await;

        let current = self
            .complaints
            .load(complaint_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(complaint_id.to_string()))?;

        let updated = match apply_transition(&current, target, actor, &metadata, at) {
            Ok(updated) => updated,
            Err(e) => {
                warn!(
                    complaint_id = %complaint_id,
                    from = %current.status(),
                    to = %target,
                    role = %actor.role,
                    error = %e,
                    "Transition refused"
                );
                return Err(e);
            }
        };

        self.complaints.save(&updated).await?;

        info!(
            complaint_id = %complaint_id,
            tracking_number = %updated.tracking_number(),
            from = %current.status(),
            to = %updated.status(),
            role = %actor.role,
            "Complaint status changed"
        );

        Ok(updated)
    }

    /// Load a complaint by id.
    pub async fn get(&self, complaint_id: &str) -> Result<Complaint> {
        self.complaints
            .load(complaint_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(complaint_id.to_string()))
    }

    /// Public lookup by tracking number.
    pub async fn lookup(&self, tracking_number: &str) -> Result<Complaint> {
        self.complaints
            .load_by_tracking_number(tracking_number.trim())
            .await?
            .ok_or_else(|| EngineError::NotFound(tracking_number.to_string()))
    }

    /// Open complaints assigned to a role, newest first.
    ///
    /// A district narrows the queue to complaints routed to that district,
    /// which is how Muktar queues are scoped.
    pub async fn queue(&self, role: StaffRole, district: Option<&District>) -> Result<Vec<Complaint>> {
        let mut open: Vec<Complaint> = self
            .complaints
            .list()
            .await?
            .into_iter()
            .filter(|c| c.assigned_role() == role && !c.is_terminal())
            .filter(|c| district.map_or(true, |d| c.assigned_district() == Some(d)))
            .collect();

        open.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.tracking_number().as_str().cmp(b.tracking_number().as_str()))
        });
        Ok(open)
    }

    /// Whether a contact could submit at `now`, without reserving anything.
    pub async fn admission_status(&self, contact: &str, now: DateTime<Utc>) -> Result<AdmissionDecision> {
        Ok(self.admission.probe(contact.trim(), now).await?)
    }
}
