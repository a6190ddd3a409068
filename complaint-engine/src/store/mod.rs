//! Persistence seams.
//!
//! The engine calls these traits but does not own storage. In-memory
//! implementations back tests and the replay CLI.

mod memory;
mod traits;

pub use memory::{InMemoryAdmissionWindowStore, InMemoryComplaintStore};
pub use traits::{AdmissionWindowStore, ComplaintStore, StoreError};
