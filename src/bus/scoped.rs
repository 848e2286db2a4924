//! Isolated channel over a parent [`EventBus`]
//!
//! Every handler added through a [`ScopedBus`] is remembered, so the whole set
//! can be severed at once while handlers added straight to the parent stay
//! put. The activity manager hands one of these to each activity run.

use crate::bus::event_bus::EventBus;
use crate::bus::registration::HandlerRegistration;
use crate::core::errors::{Result, WaypointError};
use parking_lot::Mutex;
use std::any::{type_name, Any};
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct ScopedState {
    registrations: Vec<HandlerRegistration>,
    sealed: bool,
}

#[derive(Clone)]
pub struct ScopedBus {
    parent: EventBus,
    state: Arc<Mutex<ScopedState>>,
}

impl ScopedBus {
    pub fn new(parent: &EventBus) -> Self {
        Self {
            parent: parent.clone(),
            state: Arc::new(Mutex::new(ScopedState::default())),
        }
    }

    /// Register a handler on the parent bus and track it here.
    ///
    /// Fails with `WaypointError::ChannelSealed` once [`seal`](Self::seal)
    /// has been called.
    pub fn add_handler<E, F>(&self, handler: F) -> Result<HandlerRegistration>
    where
        E: Any,
        F: Fn(&mut E) -> Result<()> + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        if state.sealed {
            debug!(event = type_name::<E>(), "Rejected handler on sealed channel");
            return Err(WaypointError::channel_sealed(format!(
                "cannot add a {} handler after the run ended",
                type_name::<E>()
            )));
        }
        let registration = self.parent.add_handler(handler);
        state.registrations.push(registration.clone());
        Ok(registration)
    }

    /// Fire through the parent bus
    pub fn fire<E: Any>(&self, event: &mut E) -> Result<()> {
        self.parent.fire(event)
    }

    /// Remove every handler added through this channel. Returns how many
    /// were still registered.
    pub fn remove_handlers(&self) -> usize {
        let drained = std::mem::take(&mut self.state.lock().registrations);
        Self::sever(drained)
    }

    /// Remove every handler and refuse new ones from now on
    pub fn seal(&self) -> usize {
        let drained = {
            let mut state = self.state.lock();
            state.sealed = true;
            std::mem::take(&mut state.registrations)
        };
        Self::sever(drained)
    }

    pub fn is_sealed(&self) -> bool {
        self.state.lock().sealed
    }

    /// Handlers added through this channel that are still live
    pub fn registered_count(&self) -> usize {
        self.state
            .lock()
            .registrations
            .iter()
            .filter(|registration| registration.is_registered())
            .count()
    }

    fn sever(registrations: Vec<HandlerRegistration>) -> usize {
        let mut removed = 0;
        for registration in registrations {
            if registration.is_registered() {
                registration.remove();
                removed += 1;
            }
        }
        removed
    }
}

impl std::fmt::Debug for ScopedBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ScopedBus")
            .field("registrations", &state.registrations.len())
            .field("sealed", &state.sealed)
            .finish()
    }
}
