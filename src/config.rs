//! Binder configuration parameters
//!
//! All tunable limits for the binder and the simulated engine.
//! Loaded from a JSON document; missing fields fall back to defaults.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gatt::InstanceId;

/// Upper bound on `max_instances` (one byte of client interface ids).
const MAX_INSTANCES_LIMIT: usize = 255;

/// Largest attribute value ATT allows.
const MAX_ATTRIBUTE_LEN_LIMIT: usize = 512;

/// Core binder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Maximum live plus pending server registrations
    pub max_instances: usize,
    /// Longest value accepted by `send_response` / `send_notification`
    pub max_attribute_len: usize,
    /// Simulated engine parameters (host builds and tests)
    pub sim: SimConfig,
}

/// Simulated engine parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// First instance id handed out by the simulated factory
    pub first_instance_id: InstanceId,
    /// First attribute handle allocated by simulated servers
    pub first_handle: u16,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            max_instances: 32,
            max_attribute_len: MAX_ATTRIBUTE_LEN_LIMIT,
            sim: SimConfig::default(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            first_instance_id: 1,
            first_handle: 1,
        }
    }
}

impl BinderConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| {
            warn!("config: {}", e);
            ConfigError::Malformed
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.  Out-of-range values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_INSTANCES_LIMIT).contains(&self.max_instances) {
            return Err(ConfigError::ValidationFailed("max_instances must be 1–255"));
        }
        if !(1..=MAX_ATTRIBUTE_LEN_LIMIT).contains(&self.max_attribute_len) {
            return Err(ConfigError::ValidationFailed(
                "max_attribute_len must be 1–512",
            ));
        }
        if self.sim.first_instance_id < 0 {
            return Err(ConfigError::ValidationFailed(
                "sim.first_instance_id must be non-negative",
            ));
        }
        if self.sim.first_handle == 0 {
            return Err(ConfigError::ValidationFailed(
                "sim.first_handle must be non-zero",
            ));
        }
        Ok(())
    }
}
