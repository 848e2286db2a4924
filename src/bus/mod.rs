//! Event bus and the per-activity isolated channel

pub mod event_bus;
pub mod registration;
pub mod scoped;

pub use event_bus::EventBus;
pub use registration::{CompositeRegistration, HandlerRegistration};
pub use scoped::ScopedBus;
