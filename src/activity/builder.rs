//! Builder for the activity manager

use crate::activity::mapper::ActivityMapper;
use crate::activity::manager::ActivityManager;
use crate::bus::EventBus;
use crate::core::config::ManagerConfig;
use crate::core::errors::{Result, WaypointError};

/// Fluent builder for an [`ActivityManager`]
pub struct ActivityManagerBuilder<P, V> {
    config: ManagerConfig,
    mapper: Option<Box<dyn ActivityMapper<P, V>>>,
    bus: Option<EventBus>,
}

impl<P, V> Default for ActivityManagerBuilder<P, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, V> ActivityManagerBuilder<P, V> {
    pub fn new() -> Self {
        Self {
            config: ManagerConfig::default(),
            mapper: None,
            bus: None,
        }
    }

    /// Set the place to activity mapper
    pub fn mapper<M>(mut self, mapper: M) -> Self
    where
        M: ActivityMapper<P, V> + 'static,
    {
        self.mapper = Some(Box::new(mapper));
        self
    }

    /// Set the bus the manager listens on
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Set manager name
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn clear_display_on_stop(mut self, enabled: bool) -> Self {
        self.config.clear_display_on_stop = enabled;
        self
    }

    pub fn seal_retired_channels(mut self, enabled: bool) -> Self {
        self.config.seal_retired_channels = enabled;
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ActivityManager<P, V>>
    where
        P: Send + Sync + 'static,
        V: 'static,
    {
        self.config.validate()?;
        let mapper = self
            .mapper
            .ok_or_else(|| WaypointError::configuration_field("an activity mapper is required", "mapper"))?;
        let bus = self
            .bus
            .ok_or_else(|| WaypointError::configuration_field("an event bus is required", "event_bus"))?;
        Ok(ActivityManager::from_parts(mapper, bus, self.config))
    }
}
