//! In-memory stores.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{AdmissionWindowStore, ComplaintStore, StoreError};
use crate::admission::AdmissionWindow;
use crate::types::Complaint;

/// Complaint store held in process memory.
#[derive(Default)]
pub struct InMemoryComplaintStore {
    /// Complaints by id
    complaints: Arc<RwLock<HashMap<String, Complaint>>>,
    /// Tracking number to complaint id
    by_tracking_number: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryComplaintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored complaints.
    pub async fn len(&self) -> usize {
        self.complaints.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.complaints.read().await.is_empty()
    }
}

#[async_trait]
impl ComplaintStore for InMemoryComplaintStore {
    async fn load(&self, id: &str) -> Result<Option<Complaint>, StoreError> {
        let complaints = self.complaints.read().await;
        Ok(complaints.get(id).cloned())
    }

    async fn load_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Complaint>, StoreError> {
        let index = self.by_tracking_number.read().await;
        let Some(id) = index.get(tracking_number) else {
            return Ok(None);
        };
        let complaints = self.complaints.read().await;
        Ok(complaints.get(id).cloned())
    }

    async fn save(&self, complaint: &Complaint) -> Result<(), StoreError> {
        // Index lock first, same order as load_by_tracking_number
        let mut index = self.by_tracking_number.write().await;
        let tracking_number = complaint.tracking_number().as_str();

        if let Some(owner) = index.get(tracking_number) {
            if owner != complaint.id() {
                return Err(StoreError::Conflict(format!(
                    "tracking number {} already issued",
                    tracking_number
                )));
            }
        }

        let mut complaints = self.complaints.write().await;
        index.insert(tracking_number.to_string(), complaint.id().to_string());
        complaints.insert(complaint.id().to_string(), complaint.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut index = self.by_tracking_number.write().await;
        let mut complaints = self.complaints.write().await;
        if let Some(removed) = complaints.remove(id) {
            index.remove(removed.tracking_number().as_str());
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Complaint>, StoreError> {
        let complaints = self.complaints.read().await;
        Ok(complaints.values().cloned().collect())
    }
}

/// Admission window store held in process memory.
#[derive(Default)]
pub struct InMemoryAdmissionWindowStore {
    windows: Arc<RwLock<HashMap<String, AdmissionWindow>>>,
}

impl InMemoryAdmissionWindowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdmissionWindowStore for InMemoryAdmissionWindowStore {
    async fn load(&self, contact: &str) -> Result<Option<AdmissionWindow>, StoreError> {
        let windows = self.windows.read().await;
        Ok(windows.get(contact).cloned())
    }

    async fn save(&self, contact: &str, window: AdmissionWindow) -> Result<(), StoreError> {
        let mut windows = self.windows.write().await;
        windows.insert(contact.to_string(), window);
        Ok(())
    }

    async fn delete(&self, contact: &str) -> Result<(), StoreError> {
        let mut windows = self.windows.write().await;
        windows.remove(contact);
        Ok(())
    }
}
