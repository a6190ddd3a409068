//! Routing policy.
//!
//! Routing never fails a submission for lack of staff: when the directory
//! has nobody to offer, the complaint goes to the role's office placeholder.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use super::directory::StaffDirectory;
use crate::config::RoutingConfig;
use crate::types::{District, StaffRole, Urgency};

/// Who a complaint is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assignee {
    /// A specific staff member from the directory
    Staff { staff_id: String, name: String },
    /// Informational office label, no staff record behind it
    Placeholder { label: String },
}

impl Assignee {
    /// Display label.
    pub fn label(&self) -> &str {
        match self {
            Assignee::Staff { name, .. } => name,
            Assignee::Placeholder { label } => label,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Assignee::Placeholder { .. })
    }
}

/// Result of routing a complaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub role: StaffRole,
    /// Set for Muktar routes, which are district-scoped
    pub district: Option<District>,
    pub assignee: Assignee,
}

/// Maps urgency and district to an assignment.
#[derive(Debug, Clone, Default)]
pub struct RoutingPolicy {
    config: RoutingConfig,
}

impl RoutingPolicy {
    /// Create a policy with the given placeholder labels.
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Role responsible for an urgency level.
    pub fn role_for(urgency: Urgency) -> StaffRole {
        match urgency {
            Urgency::Normal => StaffRole::Muktar,
            Urgency::Urgent => StaffRole::Admin,
            Urgency::Critical => StaffRole::Manager,
        }
    }

    /// Placeholder label for a role with nobody available.
    pub fn placeholder_for(&self, role: StaffRole) -> &str {
        match role {
            StaffRole::Muktar => &self.config.general_office,
            StaffRole::Admin => &self.config.admin_office,
            StaffRole::Manager => &self.config.manager_office,
        }
    }

    /// Route a complaint. Total and deterministic for a given directory.
    pub fn route(&self, urgency: Urgency, district: &District, directory: &dyn StaffDirectory) -> Assignment {
        let role = Self::role_for(urgency);

        let resolved = match role {
            StaffRole::Muktar => directory.by_district(role, district),
            StaffRole::Admin | StaffRole::Manager => {
                directory.by_role(role).into_iter().find(|s| s.available)
            }
        };

        let assignee = match resolved {
            Some(member) => Assignee::Staff {
                staff_id: member.id,
                name: member.name,
            },
            None => {
                let label = self.placeholder_for(role).to_string();
                debug!(
                    role = %role,
                    district = %district,
                    placeholder = %label,
                    "No staff available, routing to placeholder"
                );
                Assignee::Placeholder { label }
            }
        };

        Assignment {
            role,
            district: (role == StaffRole::Muktar).then(|| district.clone()),
            assignee,
        }
    }
}
