//! Storage traits.

use async_trait::async_trait;

use crate::admission::AdmissionWindow;
use crate::types::Complaint;

/// Error types for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend is not reachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Write conflicts with existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Complaint persistence.
#[async_trait]
pub trait ComplaintStore: Send + Sync {
    /// Load a complaint by id.
    async fn load(&self, id: &str) -> Result<Option<Complaint>, StoreError>;

    /// Load a complaint by its public tracking number.
    async fn load_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Complaint>, StoreError>;

    /// Insert or replace a complaint.
    ///
    /// Must fail with `Conflict` if the tracking number already belongs to a
    /// different complaint.
    async fn save(&self, complaint: &Complaint) -> Result<(), StoreError>;

    /// Remove a complaint. Used to undo a submission whose later steps failed.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// All stored complaints.
    async fn list(&self) -> Result<Vec<Complaint>, StoreError>;
}

/// Admission window persistence, keyed by submitter contact.
#[async_trait]
pub trait AdmissionWindowStore: Send + Sync {
    /// Load the window for a contact.
    async fn load(&self, contact: &str) -> Result<Option<AdmissionWindow>, StoreError>;

    /// Create or overwrite the window for a contact.
    async fn save(&self, contact: &str, window: AdmissionWindow) -> Result<(), StoreError>;

    /// Remove the window for a contact. Used to undo a contact's first
    /// submission when storing it failed.
    async fn delete(&self, contact: &str) -> Result<(), StoreError>;
}
