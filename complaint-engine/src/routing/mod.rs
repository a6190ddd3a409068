//! Routing of new complaints to a responsible staff role.
//!
//! - **Directory**: read-only lookup of staff by role and district
//! - **Policy**: urgency decides the role, the directory decides the person,
//!   and a named placeholder stands in when nobody is available

mod directory;
mod policy;

pub use directory::{InMemoryStaffDirectory, StaffDirectory, StaffMember};
pub use policy::{Assignee, Assignment, RoutingPolicy};
