//! Configuration for the complaint engine.

use serde::{Deserialize, Serialize};

use crate::types::{EngineError, Result};

/// Upper bound on the cooldown (one year).
pub const MAX_COOLDOWN_SECS: u64 = 365 * 24 * 60 * 60;

/// Configuration for a lifecycle coordinator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Admission control configuration
    #[serde(default)]
    pub admission: AdmissionConfig,
    /// Intake validation configuration
    #[serde(default)]
    pub intake: IntakeConfig,
    /// Routing placeholder labels
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Tracking number format
    #[serde(default)]
    pub tracking: TrackingConfig,
}

impl EngineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Builder: set the cooldown between accepted submissions.
    pub fn with_cooldown_secs(mut self, secs: u64) -> Self {
        self.admission.cooldown_secs = secs;
        self
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.admission.cooldown_secs == 0 {
            return Err(EngineError::Config(
                "admission.cooldown_secs must be positive".to_string(),
            ));
        }
        if self.admission.cooldown_secs > MAX_COOLDOWN_SECS {
            return Err(EngineError::Config(format!(
                "admission.cooldown_secs exceeds {}",
                MAX_COOLDOWN_SECS
            )));
        }
        if self.intake.districts.is_empty() {
            return Err(EngineError::Config("intake.districts is empty".to_string()));
        }
        if self.intake.categories.is_empty() {
            return Err(EngineError::Config("intake.categories is empty".to_string()));
        }
        if self.tracking.prefix.trim().is_empty() {
            return Err(EngineError::Config("tracking.prefix is empty".to_string()));
        }
        Ok(())
    }
}

/// Admission control configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Minimum interval between accepted submissions from one contact (seconds)
    pub cooldown_secs: u64,
}

impl AdmissionConfig {
    /// Cooldown as a signed duration, clamped to `MAX_COOLDOWN_SECS`.
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cooldown_secs.min(MAX_COOLDOWN_SECS) as i64)
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 24 * 60 * 60, // 24 hours
        }
    }
}

/// Intake validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Service districts a complaint may be filed against
    pub districts: Vec<String>,
    /// Accepted categories
    pub categories: Vec<String>,
    /// Maximum title length (characters)
    pub max_title_len: usize,
    /// Maximum description length (characters)
    pub max_description_len: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            districts: (1..=5).map(|n| format!("District {}", n)).collect(),
            categories: vec![
                "water".to_string(),
                "electricity".to_string(),
                "roads".to_string(),
                "sanitation".to_string(),
                "waste".to_string(),
                "other".to_string(),
            ],
            max_title_len: 200,
            max_description_len: 5000,
        }
    }
}

/// Labels used when no staff member can be resolved for a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Fallback for NORMAL complaints with no Muktar in the district
    pub general_office: String,
    /// Fallback for URGENT complaints with no Admin
    pub admin_office: String,
    /// Fallback for CRITICAL complaints with no Manager
    pub manager_office: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            general_office: "General Office".to_string(),
            admin_office: "Admin Office".to_string(),
            manager_office: "Manager Office".to_string(),
        }
    }
}

/// Tracking number format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Prefix before the numeric part, e.g. `TRK`
    pub prefix: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            prefix: "TRK".to_string(),
        }
    }
}
