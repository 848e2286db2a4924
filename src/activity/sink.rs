//! Guarded output sink handed to each activity run

use crate::activity::traits::RenderTarget;
use crate::activity::manager::Slot;
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::{Arc, Weak};
use tracing::trace;

/// Forwards writes to the manager's display only while its run is current.
///
/// Each run gets a sink carrying that run's token. A write from a run that
/// has been stopped, cancelled or replaced is dropped without error. The
/// first accepted write also marks the run as fully started.
///
/// The write itself runs under the manager's render lock but not its state
/// lock, so a display may fire place changes or query the manager from
/// `set_content`. A display that blocks on another thread's sink write from
/// inside `set_content` deadlocks.
pub struct GuardedSink<V> {
    slot: Weak<Mutex<Slot<V>>>,
    render: Arc<ReentrantMutex<()>>,
    token: u64,
    manager: Arc<str>,
}

impl<V> GuardedSink<V> {
    pub(crate) fn new(
        slot: Weak<Mutex<Slot<V>>>,
        render: Arc<ReentrantMutex<()>>,
        token: u64,
        manager: Arc<str>,
    ) -> Self {
        Self {
            slot,
            render,
            token,
            manager,
        }
    }

    /// Whether writes through this sink would currently reach the display
    pub fn is_current(&self) -> bool {
        self.slot
            .upgrade()
            .map(|slot| slot.lock().current_token() == Some(self.token))
            .unwrap_or(false)
    }
}

impl<V> Clone for GuardedSink<V> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            render: self.render.clone(),
            token: self.token,
            manager: self.manager.clone(),
        }
    }
}

impl<V> RenderTarget<V> for GuardedSink<V> {
    fn set_content(&self, content: Option<V>) {
        let Some(slot) = self.slot.upgrade() else {
            trace!(manager = %self.manager, run = self.token, "Dropped write, manager is gone");
            return;
        };

        // Render lock held from the check through the write, so no other
        // thread's transition can render in between.
        let _render = self.render.lock();
        let display = {
            let mut slot = slot.lock();
            if slot.current_token() != Some(self.token) {
                trace!(manager = %self.manager, run = self.token, "Dropped write from stale run");
                return;
            }
            slot.starting_next = false;
            slot.display.clone()
        };
        match display {
            Some(display) => display.set_content(content),
            None => trace!(manager = %self.manager, run = self.token, "Dropped write, no display attached"),
        }
    }
}

impl<V> std::fmt::Debug for GuardedSink<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedSink")
            .field("manager", &self.manager)
            .field("run", &self.token)
            .finish()
    }
}
