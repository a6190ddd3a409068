//! Staff directory seam.
//!
//! The registry of staff is owned outside the engine; routing only reads a
//! snapshot of it through [`StaffDirectory`].

use serde::{Deserialize, Serialize};

use crate::types::{District, StaffRole};

/// A staff member as known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub role: StaffRole,
    /// District served; only meaningful for Muktars
    #[serde(default)]
    pub district: Option<District>,
    /// Whether the member currently takes new complaints
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl StaffMember {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: StaffRole) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            district: None,
            available: true,
        }
    }

    /// Builder: set the district served.
    pub fn in_district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(District::new(district));
        self
    }

    /// Builder: set availability.
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

/// Read-only lookup of staff.
pub trait StaffDirectory: Send + Sync {
    /// All staff holding a role, in directory order.
    fn by_role(&self, role: StaffRole) -> Vec<StaffMember>;

    /// The staff member holding a role in a district, if any.
    fn by_district(&self, role: StaffRole, district: &District) -> Option<StaffMember>;
}

/// Directory backed by an in-memory roster.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStaffDirectory {
    staff: Vec<StaffMember>,
}

impl InMemoryStaffDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a roster.
    pub fn from_roster(staff: Vec<StaffMember>) -> Self {
        Self { staff }
    }

    /// Parse a YAML list of staff members.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let staff: Vec<StaffMember> = serde_yaml::from_str(yaml)?;
        Ok(Self::from_roster(staff))
    }

    /// Builder: add a staff member.
    pub fn with_member(mut self, member: StaffMember) -> Self {
        self.staff.push(member);
        self
    }

    pub fn len(&self) -> usize {
        self.staff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staff.is_empty()
    }
}

impl StaffDirectory for InMemoryStaffDirectory {
    fn by_role(&self, role: StaffRole) -> Vec<StaffMember> {
        self.staff.iter().filter(|s| s.role == role).cloned().collect()
    }

    fn by_district(&self, role: StaffRole, district: &District) -> Option<StaffMember> {
        self.staff
            .iter()
            .filter(|s| s.role == role && s.district.as_ref() == Some(district))
            .find(|s| s.available)
            .cloned()
    }
}
