//! Activity manager configuration

use crate::core::errors::{Result, WaypointError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Activity manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Manager name, used as a field on every log line
    pub name: String,
    /// Clear the display when a visible activity is stopped, before the next
    /// one starts
    pub clear_display_on_stop: bool,
    /// Refuse new subscriptions on the channel of a run that has ended
    pub seal_retired_channels: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            name: format!("activity_manager_{}", Uuid::new_v4()),
            clear_display_on_stop: false,
            seal_retired_channels: true,
        }
    }
}

impl ManagerConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(WaypointError::configuration_field(
                "name must not be empty",
                "name",
            ));
        }
        Ok(())
    }
}
