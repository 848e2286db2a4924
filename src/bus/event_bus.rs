//! In-process event bus keyed by event type
//!
//! Handlers are stored per `TypeId` and invoked in registration order.
//! Dispatch works on a snapshot, so handlers can fire further events and add
//! or remove handlers while an event is in flight.

use crate::bus::registration::HandlerRegistration;
use crate::core::errors::{Result, WaypointError};
use dashmap::DashMap;
use std::any::{type_name, Any, TypeId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

type ErasedHandler = Arc<dyn Fn(&mut dyn Any) -> Result<()> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct HandlerEntry {
    id: u64,
    live: Arc<AtomicBool>,
    handler: ErasedHandler,
}

#[derive(Default)]
pub(crate) struct BusInner {
    handlers: DashMap<TypeId, Vec<HandlerEntry>>,
    next_id: AtomicU64,
}

impl BusInner {
    pub(crate) fn remove(&self, type_id: TypeId, id: u64) {
        if let Some(mut entries) = self.handlers.get_mut(&type_id) {
            entries.retain(|entry| entry.id != id);
        }
        self.handlers.remove_if(&type_id, |_, entries| entries.is_empty());
    }
}

/// Shared event bus. Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for events of type `E`
    pub fn add_handler<E, F>(&self, handler: F) -> HandlerRegistration
    where
        E: Any,
        F: Fn(&mut E) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let live = Arc::new(AtomicBool::new(true));
        let erased: ErasedHandler = Arc::new(move |event: &mut dyn Any| {
            match event.downcast_mut::<E>() {
                Some(event) => handler(event),
                None => Ok(()),
            }
        });

        let type_id = TypeId::of::<E>();
        self.inner
            .handlers
            .entry(type_id)
            .or_default()
            .push(HandlerEntry {
                id,
                live: live.clone(),
                handler: erased,
            });

        trace!(event = type_name::<E>(), handler_id = id, "Handler added");
        HandlerRegistration::new(Arc::downgrade(&self.inner), type_id, id, live)
    }

    /// Deliver `event` to every handler registered for `E`.
    ///
    /// All handlers run even when some fail; failures come back as one
    /// `WaypointError::Dispatch`.
    pub fn fire<E: Any>(&self, event: &mut E) -> Result<()> {
        let snapshot: Vec<HandlerEntry> = self
            .inner
            .handlers
            .get(&TypeId::of::<E>())
            .map(|entries| entries.value().clone())
            .unwrap_or_default();

        let mut causes = Vec::new();
        for entry in snapshot {
            // removed after the snapshot was taken
            if !entry.live.load(Ordering::Acquire) {
                continue;
            }
            let erased: &mut dyn Any = &mut *event;
            if let Err(err) = (entry.handler)(erased) {
                causes.push(err);
            }
        }

        if causes.is_empty() {
            Ok(())
        } else {
            Err(WaypointError::Dispatch {
                event: type_name::<E>(),
                causes,
            })
        }
    }

    /// Number of handlers currently registered for `E`
    pub fn handler_count<E: Any>(&self) -> usize {
        self.inner
            .handlers
            .get(&TypeId::of::<E>())
            .map(|entries| entries.len())
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.inner.handlers.len())
            .finish()
    }
}
