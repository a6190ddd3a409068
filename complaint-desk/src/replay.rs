//! Scripted replay of submissions and staff actions.
//!
//! A script is a YAML document with a list of steps. Submissions can be
//! labelled with `as:` and later steps refer to the complaint by that label
//! or by tracking number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use tracing::debug;

use complaint_engine::{
    Actor, AdmissionDecision, Complaint, ComplaintStatus, District, EngineError,
    LifecycleCoordinator, StaffRole, SubmissionInput, SubmissionReceipt, TrackingNumber,
    TransitionMetadata,
};

/// A replay script.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

/// One scripted operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// A resident files a complaint
    Submit {
        #[serde(default, rename = "as")]
        label: Option<String>,
        #[serde(default)]
        at: Option<DateTime<Utc>>,
        #[serde(flatten)]
        input: SubmissionInput,
    },
    /// A staff member moves a complaint
    Transition {
        complaint: String,
        to: ComplaintStatus,
        actor: Actor,
        #[serde(default)]
        at: Option<DateTime<Utc>>,
        #[serde(flatten)]
        metadata: TransitionMetadata,
    },
    /// Public lookup of a complaint
    Lookup { complaint: String },
    /// Open complaints for a role
    Queue {
        role: StaffRole,
        #[serde(default)]
        district: Option<String>,
    },
    /// Whether a phone number may submit
    Probe {
        phone: String,
        #[serde(default)]
        at: Option<DateTime<Utc>>,
    },
}

impl Step {
    fn op(&self) -> &'static str {
        match self {
            Step::Submit { .. } => "submit",
            Step::Transition { .. } => "transition",
            Step::Lookup { .. } => "lookup",
            Step::Queue { .. } => "queue",
            Step::Probe { .. } => "probe",
        }
    }
}

/// What a successful step produced.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StepOutput {
    Receipt(SubmissionReceipt),
    Complaint(Box<Complaint>),
    Queue(Vec<TrackingNumber>),
    Probe {
        allowed: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        remaining_secs: Option<i64>,
    },
}

/// Outcome line written for every step.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub step: usize,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

/// Machine-readable error, for callers that translate messages.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<i64>,
}

impl From<&EngineError> for ErrorReport {
    fn from(err: &EngineError) -> Self {
        let remaining_secs = match err {
            EngineError::RateLimited { remaining } => Some(remaining.num_seconds()),
            _ => None,
        };
        Self {
            kind: err.kind(),
            message: err.to_string(),
            remaining_secs,
        }
    }
}

/// Totals for a finished replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Drives a coordinator through a script.
pub struct Replayer<'a> {
    coordinator: &'a LifecycleCoordinator,
    /// Script label to complaint id
    labels: HashMap<String, String>,
}

impl<'a> Replayer<'a> {
    pub fn new(coordinator: &'a LifecycleCoordinator) -> Self {
        Self {
            coordinator,
            labels: HashMap::new(),
        }
    }

    /// Run every step, writing one JSON line per outcome.
    ///
    /// Engine errors are reported in the output and do not stop the replay;
    /// only failures to encode or write output do.
    pub async fn run(&mut self, script: Script, out: &mut impl Write) -> anyhow::Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();

        for (index, step) in script.steps.into_iter().enumerate() {
            let op = step.op();
            let outcome = match self.execute(step).await {
                Ok(result) => {
                    summary.succeeded += 1;
                    Outcome {
                        step: index,
                        op,
                        ok: true,
                        result: Some(result),
                        error: None,
                    }
                }
                Err(err) => {
                    summary.failed += 1;
                    Outcome {
                        step: index,
                        op,
                        ok: false,
                        result: None,
                        error: Some(ErrorReport::from(&err)),
                    }
                }
            };
            serde_json::to_writer(&mut *out, &outcome)?;
            writeln!(out)?;
        }

        Ok(summary)
    }

    async fn execute(&mut self, step: Step) -> Result<StepOutput, EngineError> {
        match step {
            Step::Submit { label, at, input } => {
                let receipt = self
                    .coordinator
                    .submit_at(input, at.unwrap_or_else(Utc::now))
                    .await?;
                if let Some(label) = label {
                    debug!(label = %label, complaint_id = %receipt.complaint_id, "Labelled submission");
                    self.labels.insert(label, receipt.complaint_id.clone());
                }
                Ok(StepOutput::Receipt(receipt))
            }
            Step::Transition {
                complaint,
                to,
                actor,
                at,
                metadata,
            } => {
                let id = self.resolve(&complaint).await?;
                let updated = self
                    .coordinator
                    .transition_at(&id, to, &actor, metadata, at.unwrap_or_else(Utc::now))
                    .await?;
                Ok(StepOutput::Complaint(Box::new(updated)))
            }
            Step::Lookup { complaint } => {
                let id = self.resolve(&complaint).await?;
                let found = self.coordinator.get(&id).await?;
                Ok(StepOutput::Complaint(Box::new(found)))
            }
            Step::Queue { role, district } => {
                let district = district.map(District::new);
                let queue = self.coordinator.queue(role, district.as_ref()).await?;
                let tracking = queue.iter().map(|c| c.tracking_number().clone()).collect();
                Ok(StepOutput::Queue(tracking))
            }
            Step::Probe { phone, at } => {
                let decision = self
                    .coordinator
                    .admission_status(&phone, at.unwrap_or_else(Utc::now))
                    .await?;
                Ok(match decision {
                    AdmissionDecision::Allowed => StepOutput::Probe {
                        allowed: true,
                        remaining_secs: None,
                    },
                    AdmissionDecision::Denied { remaining } => StepOutput::Probe {
                        allowed: false,
                        remaining_secs: Some(remaining.num_seconds()),
                    },
                })
            }
        }
    }

    /// Map a label or tracking number to a complaint id.
    async fn resolve(&self, reference: &str) -> Result<String, EngineError> {
        if let Some(id) = self.labels.get(reference) {
            return Ok(id.clone());
        }
        let complaint = self.coordinator.lookup(reference).await?;
        Ok(complaint.id().to_string())
    }
}
