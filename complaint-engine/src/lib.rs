//! Complaint Lifecycle & Admission Control Engine
//!
//! Decision core for a civic complaint desk: residents file infrastructure
//! complaints, district and municipal staff triage, route and resolve them.
//!
//! - **Status machine**: which status a complaint may move to, and who may
//!   move it
//! - **Routing policy**: which role and staff member a new complaint goes
//!   to, based on urgency and district
//! - **Admission control**: whether a submitter may file again yet
//! - **Coordinator**: composes the three into `submit` and `transition`
//!
//! # Architecture
//!
//! ```text
//! submit ──▶ validate ──▶ admission check ──▶ routing ──▶ commit window ──▶ store
//!
//! transition ──▶ lock(id) ──▶ load ──▶ status machine ──▶ store
//! ```
//!
//! Storage and the staff registry are external collaborators reached
//! through the traits in [`store`] and [`routing`].
//!
//! # Example
//!
//! ```ignore
//! use complaint_engine::{EngineConfig, LifecycleCoordinator, InMemoryStaffDirectory};
//!
//! let coordinator = LifecycleCoordinator::in_memory(
//!     EngineConfig::default(),
//!     Arc::new(InMemoryStaffDirectory::new()),
//! )?;
//! let receipt = coordinator.submit(input).await?;
//! println!("Track your complaint with {}", receipt.tracking_number);
//! ```

pub mod admission;
pub mod config;
pub mod coordinator;
pub mod history;
pub mod lifecycle;
mod locks;
pub mod routing;
pub mod store;
pub mod tracking;
pub mod types;
pub mod validation;

// Re-export main types
pub use admission::{AdmissionControl, AdmissionDecision, AdmissionWindow};
pub use config::EngineConfig;
pub use coordinator::{LifecycleCoordinator, SubmissionReceipt};
pub use history::StatusChange;
pub use lifecycle::{apply_transition, can_transition};
pub use routing::{Assignee, Assignment, InMemoryStaffDirectory, RoutingPolicy, StaffDirectory, StaffMember};
pub use store::{AdmissionWindowStore, ComplaintStore, StoreError};
pub use tracking::TrackingNumberIssuer;
pub use types::*;
