//! Activity switching driven by place changes
//!
//! An [`ActivityManager`] listens for [`PlaceChangeEvent`]s on an
//! [`EventBus`], maps each new place to an [`Activity`] and makes sure at most
//! one activity owns the display at a time.

// Core infrastructure modules
pub mod core {
    pub mod config;
    pub mod errors;
}

pub mod activity;
pub mod bus;
pub mod place;
pub mod telemetry;

// Re-exports for convenience
pub use activity::{
    same_instance, Activity, ActivityManager, ActivityManagerBuilder, ActivityMapper,
    CachingActivityMapper, FilteredActivityMapper, GuardedSink, RenderTarget,
};
pub use bus::{CompositeRegistration, EventBus, HandlerRegistration, ScopedBus};
pub use crate::core::config::ManagerConfig;
pub use crate::core::errors::{Result, WaypointError};
pub use place::{PlaceChangeEvent, PlaceChangeRequestEvent};
