//! Core types for the complaint engine.
//!
//! With the `typescript` feature enabled, the data types can be exported to
//! TypeScript using ts-rs so the intake forms and dashboards share one
//! vocabulary with the engine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::history::{is_connected_walk, StatusChange};
use crate::lifecycle::rule_for;
use crate::routing::{Assignee, RoutingPolicy};
use crate::store::StoreError;

/// Lifecycle status of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    /// Filed, not yet picked up by staff
    Unread,
    /// Accepted by staff and being worked on
    InProgress,
    /// Resolved with a resolution note
    Completed,
    /// Rejected before work started
    Rejected,
    /// Administratively closed while in progress
    Closed,
}

impl ComplaintStatus {
    /// Status every new complaint starts in.
    pub const INITIAL: Self = Self::Unread;

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "UNREAD",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
            Self::Closed => "CLOSED",
        }
    }

    /// Terminal statuses have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Closed)
    }

    pub fn all() -> [Self; 5] {
        [
            Self::Unread,
            Self::InProgress,
            Self::Completed,
            Self::Rejected,
            Self::Closed,
        ]
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "UNREAD" => Ok(Self::Unread),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "REJECTED" => Ok(Self::Rejected),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(ParseEnumError::new("status", s)),
        }
    }
}

/// Urgency chosen by the resident at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Normal,
    Urgent,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Urgent => "URGENT",
            Self::Critical => "CRITICAL",
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Normal, Self::Urgent, Self::Critical]
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "NORMAL" => Ok(Self::Normal),
            "URGENT" => Ok(Self::Urgent),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(ParseEnumError::new("urgency", s)),
        }
    }
}

/// Staff role responsible for handling complaints.
///
/// Roles are an already-verified attribute of the caller; the engine does
/// not authenticate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    /// District-level official
    Muktar,
    /// Municipal administrator
    Admin,
    /// Senior manager handling critical complaints
    Manager,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Muktar => "MUKTAR",
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Muktar, Self::Admin, Self::Manager]
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "MUKTAR" => Ok(Self::Muktar),
            "ADMIN" => Ok(Self::Admin),
            "MANAGER" => Ok(Self::Manager),
            _ => Err(ParseEnumError::new("role", s)),
        }
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_ascii_uppercase().replace(['-', ' '], "_")
}

/// Error parsing one of the engine's enumerations from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A service district, checked against the configured district list on
/// intake.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(transparent)]
pub struct District(String);

impl District {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for District {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification tag, e.g. the utility affected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-presentable code used for public lookup, e.g. `TRK-1760774400001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(transparent)]
pub struct TrackingNumber(String);

impl TrackingNumber {
    pub(crate) fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A filed infrastructure complaint.
///
/// Fields are only written by the engine: routing data is fixed at
/// creation and status changes go through the status machine.
/// Deserializing (for store implementations) rejects records whose routing
/// or history the engine could not have produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Complaint {
    id: String,
    tracking_number: TrackingNumber,
    district: District,
    category: Category,
    urgency: Urgency,
    status: ComplaintStatus,
    title: String,
    description: String,
    help_offer: Option<String>,
    submitter_contact: String,
    assigned_role: StaffRole,
    assigned_district: Option<District>,
    assignee: Assignee,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    resolution_note: Option<String>,
    rejection_reason: Option<String>,
    history: Vec<StatusChange>,
}

/// Wire shape of a stored complaint, checked before it becomes a
/// [`Complaint`].
#[derive(Deserialize)]
struct ComplaintRecord {
    id: String,
    tracking_number: TrackingNumber,
    district: District,
    category: Category,
    urgency: Urgency,
    status: ComplaintStatus,
    title: String,
    description: String,
    #[serde(default)]
    help_offer: Option<String>,
    submitter_contact: String,
    assigned_role: StaffRole,
    #[serde(default)]
    assigned_district: Option<District>,
    assignee: Assignee,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    resolution_note: Option<String>,
    #[serde(default)]
    rejection_reason: Option<String>,
    #[serde(default)]
    history: Vec<StatusChange>,
}

impl ComplaintRecord {
    fn check(&self) -> std::result::Result<(), String> {
        let expected_role = RoutingPolicy::role_for(self.urgency);
        if self.assigned_role != expected_role {
            return Err(format!(
                "assigned_role {} does not match urgency {}",
                self.assigned_role, self.urgency
            ));
        }

        let expected_district = (expected_role == StaffRole::Muktar).then(|| &self.district);
        if self.assigned_district.as_ref() != expected_district {
            return Err("assigned_district does not match routing".to_string());
        }

        if !is_connected_walk(&self.history) {
            return Err("history is not a connected walk from UNREAD".to_string());
        }
        let reached = self.history.last().map_or(ComplaintStatus::INITIAL, |c| c.to);
        if reached != self.status {
            return Err(format!("history ends at {reached} but status is {}", self.status));
        }
        for change in &self.history {
            let permitted = rule_for(change.from, change.to).is_some_and(|rule| rule.permits(change.role));
            if !permitted {
                return Err(format!(
                    "history step {} -> {} by {} is not allowed",
                    change.from, change.to, change.role
                ));
            }
        }

        match self.status {
            ComplaintStatus::Completed if self.resolution_note.is_none() => {
                Err("completed complaint has no resolution_note".to_string())
            }
            ComplaintStatus::Rejected | ComplaintStatus::Closed if self.rejection_reason.is_none() => {
                Err(format!("{} complaint has no rejection_reason", self.status))
            }
            _ => Ok(()),
        }
    }
}

impl<'de> Deserialize<'de> for Complaint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let record = ComplaintRecord::deserialize(deserializer)?;
        record.check().map_err(serde::de::Error::custom)?;

        Ok(Self {
            id: record.id,
            tracking_number: record.tracking_number,
            district: record.district,
            category: record.category,
            urgency: record.urgency,
            status: record.status,
            title: record.title,
            description: record.description,
            help_offer: record.help_offer,
            submitter_contact: record.submitter_contact,
            assigned_role: record.assigned_role,
            assigned_district: record.assigned_district,
            assignee: record.assignee,
            created_at: record.created_at,
            updated_at: record.updated_at,
            resolution_note: record.resolution_note,
            rejection_reason: record.rejection_reason,
            history: record.history,
        })
    }
}

/// Everything needed to create a complaint record.
#[derive(Debug, Clone)]
pub(crate) struct NewComplaint {
    pub id: String,
    pub tracking_number: TrackingNumber,
    pub district: District,
    pub category: Category,
    pub urgency: Urgency,
    pub title: String,
    pub description: String,
    pub help_offer: Option<String>,
    pub submitter_contact: String,
    pub assigned_role: StaffRole,
    pub assigned_district: Option<District>,
    pub assignee: Assignee,
    pub created_at: DateTime<Utc>,
}

impl Complaint {
    /// Create a complaint in the initial status.
    pub(crate) fn create(new: NewComplaint) -> Self {
        Self {
            id: new.id,
            tracking_number: new.tracking_number,
            district: new.district,
            category: new.category,
            urgency: new.urgency,
            status: ComplaintStatus::INITIAL,
            title: new.title,
            description: new.description,
            help_offer: new.help_offer,
            submitter_contact: new.submitter_contact,
            assigned_role: new.assigned_role,
            assigned_district: new.assigned_district,
            assignee: new.assignee,
            created_at: new.created_at,
            updated_at: new.created_at,
            resolution_note: None,
            rejection_reason: None,
            history: Vec::new(),
        }
    }

    /// Record a status change. Only the status machine calls this, on a
    /// clone it has fully validated.
    pub(crate) fn record_transition(
        &mut self,
        change: StatusChange,
        resolution_note: Option<String>,
        rejection_reason: Option<String>,
    ) {
        self.status = change.to;
        self.updated_at = change.at;
        if resolution_note.is_some() {
            self.resolution_note = resolution_note;
        }
        if rejection_reason.is_some() {
            self.rejection_reason = rejection_reason;
        }
        self.history.push(change);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracking_number(&self) -> &TrackingNumber {
        &self.tracking_number
    }

    pub fn district(&self) -> &District {
        &self.district
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn status(&self) -> ComplaintStatus {
        self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn help_offer(&self) -> Option<&str> {
        self.help_offer.as_deref()
    }

    pub fn submitter_contact(&self) -> &str {
        &self.submitter_contact
    }

    pub fn assigned_role(&self) -> StaffRole {
        self.assigned_role
    }

    pub fn assigned_district(&self) -> Option<&District> {
        self.assigned_district.as_ref()
    }

    pub fn assignee(&self) -> &Assignee {
        &self.assignee
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn resolution_note(&self) -> Option<&str> {
        self.resolution_note.as_deref()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Applied transitions, oldest first.
    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Raw submission as received from the intake form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct SubmissionInput {
    pub district: String,
    pub category: String,
    pub urgency: Urgency,
    pub title: String,
    pub description: String,
    /// Phone number, `09` followed by 8 digits. Also the submitter's
    /// contact identity for admission control.
    pub phone: String,
    #[serde(default)]
    pub help_offer: Option<String>,
}

/// The staff member requesting a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Actor {
    pub role: StaffRole,
    #[serde(default)]
    pub staff_id: Option<String>,
}

impl Actor {
    pub fn new(role: StaffRole) -> Self {
        Self {
            role,
            staff_id: None,
        }
    }

    pub fn with_staff_id(mut self, staff_id: impl Into<String>) -> Self {
        self.staff_id = Some(staff_id.into());
        self
    }
}

/// Notes accompanying a transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct TransitionMetadata {
    #[serde(default)]
    pub resolution_note: Option<String>,
    /// Rejection reason, or the closure note for administrative closure.
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl TransitionMetadata {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_resolution_note(mut self, note: impl Into<String>) -> Self {
        self.resolution_note = Some(note.into());
        self
    }

    pub fn with_rejection_reason(mut self, reason: impl Into<String>) -> Self {
        self.rejection_reason = Some(reason.into());
        self
    }
}

/// Submission form field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionField {
    Title,
    Description,
    Phone,
    District,
    Category,
    HelpOffer,
}

impl fmt::Display for SubmissionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Phone => "phone",
            Self::District => "district",
            Self::Category => "category",
            Self::HelpOffer => "help_offer",
        };
        f.write_str(name)
    }
}

/// Transition metadata a given edge requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    ResolutionNote,
    RejectionReason,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResolutionNote => f.write_str("resolution_note"),
            Self::RejectionReason => f.write_str("rejection_reason"),
        }
    }
}

/// Error types for the complaint engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed submission input
    #[error("Invalid {field}: {reason}")]
    Validation {
        field: SubmissionField,
        reason: String,
    },

    /// Submitter is inside the cooldown window
    #[error("Rate limited, retry in {}s", .remaining.num_seconds())]
    RateLimited { remaining: Duration },

    /// Role not permitted for an existing edge
    #[error("{role} may not move a complaint from {from} to {to}")]
    Unauthorized {
        role: StaffRole,
        from: ComplaintStatus,
        to: ComplaintStatus,
    },

    /// No such edge in the status machine
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },

    /// Transition lacks mandatory metadata
    #[error("Missing required field: {0}")]
    MissingRequiredField(RequiredField),

    /// Referenced complaint does not exist
    #[error("Complaint not found: {0}")]
    NotFound(String),

    /// Persistence dependency failed
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Persistence failed and undoing the earlier step failed too
    #[error("Storage error: {cause}; rollback also failed: {rollback}")]
    RollbackFailed {
        cause: StoreError,
        rollback: StoreError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Stable machine-readable kind, for callers mapping errors to
    /// translated messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::RateLimited { .. } => "rate_limited",
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::MissingRequiredField(_) => "missing_required_field",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) | Self::RollbackFailed { .. } => "storage",
            Self::Config(_) => "config",
        }
    }

    pub(crate) fn validation(field: SubmissionField, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
