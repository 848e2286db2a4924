use crate::bus::event_bus::BusInner;
use std::any::TypeId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Handle for one handler added to an [`EventBus`](crate::bus::EventBus).
///
/// Dropping the handle leaves the handler registered; call [`remove`](Self::remove).
#[derive(Debug, Clone)]
pub struct HandlerRegistration {
    bus: Weak<BusInner>,
    type_id: TypeId,
    id: u64,
    live: Arc<AtomicBool>,
}

impl HandlerRegistration {
    pub(crate) fn new(bus: Weak<BusInner>, type_id: TypeId, id: u64, live: Arc<AtomicBool>) -> Self {
        Self {
            bus,
            type_id,
            id,
            live,
        }
    }

    /// Remove the handler. Safe to call more than once.
    pub fn remove(&self) {
        if !self.live.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.type_id, self.id);
        }
    }

    pub fn is_registered(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Several registrations removed together
#[derive(Debug, Clone, Default)]
pub struct CompositeRegistration {
    registrations: Vec<HandlerRegistration>,
}

impl CompositeRegistration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, registration: HandlerRegistration) {
        self.registrations.push(registration);
    }

    pub fn with(mut self, registration: HandlerRegistration) -> Self {
        self.push(registration);
        self
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn remove(&self) {
        for registration in &self.registrations {
            registration.remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bus::EventBus;

    struct Tick;
    struct Tock;

    #[test]
    fn test_remove_is_idempotent() {
        let bus = EventBus::new();
        let registration = bus.add_handler(|_: &mut Tick| Ok(()));
        assert!(registration.is_registered());

        registration.remove();
        registration.remove();
        assert!(!registration.is_registered());
        assert_eq!(bus.handler_count::<Tick>(), 0);
    }

    #[test]
    fn test_remove_after_bus_dropped() {
        let bus = EventBus::new();
        let registration = bus.add_handler(|_: &mut Tick| Ok(()));
        drop(bus);

        registration.remove();
        assert!(!registration.is_registered());
    }

    #[test]
    fn test_clones_share_state() {
        let bus = EventBus::new();
        let registration = bus.add_handler(|_: &mut Tick| Ok(()));
        let copy = registration.clone();

        copy.remove();
        assert!(!registration.is_registered());
    }

    #[test]
    fn test_composite_removes_every_member() {
        let bus = EventBus::new();
        let composite = super::CompositeRegistration::new()
            .with(bus.add_handler(|_: &mut Tick| Ok(())))
            .with(bus.add_handler(|_: &mut Tock| Ok(())));
        let untouched = bus.add_handler(|_: &mut Tick| Ok(()));

        assert_eq!(composite.len(), 2);
        composite.remove();

        assert_eq!(bus.handler_count::<Tick>(), 1);
        assert_eq!(bus.handler_count::<Tock>(), 0);
        assert!(untouched.is_registered());
    }
}
