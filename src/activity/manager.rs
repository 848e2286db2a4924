//! Activity manager - runs at most one activity at a time
//!
//! The manager listens for place changes on the event bus, resolves the next
//! activity through its mapper, retires the current one and starts the new
//! one with a fresh [`ScopedBus`] and [`GuardedSink`].
//!
//! Retiring depends on how far the current run got:
//! - still starting (nothing shown yet): `on_cancel`, then its channel is sealed
//! - visible: channel severed, `on_stop`, channel sealed again to catch
//!   handlers added during teardown
//!
//! Stop and start failures are captured separately and reported together as
//! one `WaypointError::Transition` once the new activity is current. Cancel
//! and may_stop failures propagate straight away.
//!
//! Activity and display code is never called with the state lock held, so
//! activities may fire further place changes from inside `start`, `on_stop`
//! or `on_cancel`, and a display may do so from `set_content`. Each
//! transition takes an epoch; when a nested transition begins while an outer
//! one is still tearing down, the newer one wins and the outer one stops
//! there. A newer transition that ended with nothing current leaves the
//! display empty.
//!
//! Display writes are serialized by a separate reentrant render lock, always
//! taken before the state lock.

use crate::activity::traits::{Activity, RenderTarget};
use crate::activity::builder::ActivityManagerBuilder;
use crate::activity::mapper::ActivityMapper;
use crate::activity::same_instance;
use crate::activity::sink::GuardedSink;
use crate::bus::{CompositeRegistration, EventBus, ScopedBus};
use crate::core::config::ManagerConfig;
use crate::core::errors::{Result, WaypointError};
use crate::place::{PlaceChangeEvent, PlaceChangeRequestEvent};
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// One activity run: the instance plus what was minted for it
pub(crate) struct Run<V> {
    token: u64,
    activity: Arc<dyn Activity<V>>,
    channel: ScopedBus,
}

/// State shared between the manager and the sinks it hands out
pub(crate) struct Slot<V> {
    pub(crate) display: Option<Arc<dyn RenderTarget<V>>>,
    pub(crate) starting_next: bool,
    current: Option<Run<V>>,
    next_token: u64,
    epoch: u64,
}

impl<V> Slot<V> {
    fn new() -> Self {
        Self {
            display: None,
            starting_next: false,
            current: None,
            next_token: 0,
            epoch: 0,
        }
    }

    pub(crate) fn current_token(&self) -> Option<u64> {
        self.current.as_ref().map(|run| run.token)
    }
}

fn clear<V>(display: Option<Arc<dyn RenderTarget<V>>>) {
    if let Some(display) = display {
        display.set_content(None);
    }
}

struct ManagerInner<P, V> {
    name: Arc<str>,
    config: ManagerConfig,
    mapper: Box<dyn ActivityMapper<P, V>>,
    bus: EventBus,
    slot: Arc<Mutex<Slot<V>>>,
    render: Arc<ReentrantMutex<()>>,
    // Some iff a display is set
    registration: Mutex<Option<CompositeRegistration>>,
}

/// Manages the activities kicked off by place changes.
///
/// Nothing happens until [`set_display`](Self::set_display) is given a render
/// target. Cloning yields another handle to the same manager.
pub struct ActivityManager<P, V> {
    inner: Arc<ManagerInner<P, V>>,
}

impl<P, V> Clone for ActivityManager<P, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P, V> ActivityManager<P, V>
where
    P: Send + Sync + 'static,
    V: 'static,
{
    /// Create a manager with the default configuration. Next call
    /// [`set_display`](Self::set_display).
    pub fn new<M>(mapper: M, bus: EventBus) -> Self
    where
        M: ActivityMapper<P, V> + 'static,
    {
        Self::from_parts(Box::new(mapper), bus, ManagerConfig::default())
    }

    pub fn with_config<M>(mapper: M, bus: EventBus, config: ManagerConfig) -> Result<Self>
    where
        M: ActivityMapper<P, V> + 'static,
    {
        config.validate()?;
        Ok(Self::from_parts(Box::new(mapper), bus, config))
    }

    pub fn builder() -> ActivityManagerBuilder<P, V> {
        ActivityManagerBuilder::new()
    }

    pub(crate) fn from_parts(
        mapper: Box<dyn ActivityMapper<P, V>>,
        bus: EventBus,
        config: ManagerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                name: Arc::from(config.name.as_str()),
                config,
                mapper,
                bus,
                slot: Arc::new(Mutex::new(Slot::new())),
                render: Arc::new(ReentrantMutex::new(())),
                registration: Mutex::new(None),
            }),
        }
    }

    /// Set the display, subscribing to place events when it goes from unset
    /// to set and unsubscribing when it goes back.
    ///
    /// Unsetting the display does not stop the current activity.
    pub fn set_display(&self, display: Option<Arc<dyn RenderTarget<V>>>) {
        let mut registration = self.inner.registration.lock();
        let (was_active, will_be_active) = {
            let mut slot = self.inner.slot.lock();
            let was_active = slot.display.is_some();
            slot.display = display;
            (was_active, slot.display.is_some())
        };
        if was_active == will_be_active {
            return;
        }

        if will_be_active {
            *registration = Some(self.subscribe());
            info!(manager = %self.inner.name, "Display set, listening for place changes");
        } else if let Some(previous) = registration.take() {
            previous.remove();
            info!(manager = %self.inner.name, "Display cleared, stopped listening for place changes");
        }
    }

    fn subscribe(&self) -> CompositeRegistration {
        let for_change = Arc::downgrade(&self.inner);
        let for_request = for_change.clone();
        CompositeRegistration::new()
            .with(
                self.inner
                    .bus
                    .add_handler(move |event: &mut PlaceChangeEvent<P>| {
                        with_live(&for_change, |inner| inner.on_place_change(event))
                    }),
            )
            .with(
                self.inner
                    .bus
                    .add_handler(move |event: &mut PlaceChangeRequestEvent<P>| {
                        with_live(&for_request, |inner| inner.on_place_change_request(event))
                    }),
            )
    }

    /// Retire the current activity, find the next one and start it
    pub fn on_place_change(&self, event: &PlaceChangeEvent<P>) -> Result<()> {
        self.inner.on_place_change(event)
    }

    /// Ask the current activity whether it is willing to stop
    pub fn on_place_change_request(&self, event: &mut PlaceChangeRequestEvent<P>) -> Result<()> {
        self.inner.on_place_change_request(event)
    }

    /// Whether the manager is listening to the bus
    pub fn is_active(&self) -> bool {
        self.inner.registration.lock().is_some()
    }

    /// Whether the current activity has been started but not shown anything
    pub fn is_starting(&self) -> bool {
        self.inner.slot.lock().starting_next
    }

    pub fn current_activity_name(&self) -> Option<String> {
        self.inner
            .slot
            .lock()
            .current
            .as_ref()
            .map(|run| run.activity.name().to_string())
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }
}

fn with_live<P, V>(
    inner: &Weak<ManagerInner<P, V>>,
    handle: impl FnOnce(&ManagerInner<P, V>) -> Result<()>,
) -> Result<()> {
    match inner.upgrade() {
        Some(inner) => handle(inner.as_ref()),
        None => Ok(()),
    }
}

impl<P, V> ManagerInner<P, V> {
    fn on_place_change(&self, event: &PlaceChangeEvent<P>) -> Result<()> {
        let next = self.mapper.activity_for(event.new_place());

        let (outgoing, epoch) = {
            let mut slot = self.slot.lock();
            // bumped even for a no-op so a teardown in progress sees it
            slot.epoch += 1;
            let unchanged = match (slot.current.as_ref(), next.as_ref()) {
                (Some(run), Some(next)) => same_instance(&run.activity, next),
                (None, None) => true,
                _ => false,
            };
            if unchanged {
                debug!(manager = %self.name, "Place resolved to the current activity");
                return Ok(());
            }
            let was_starting = std::mem::take(&mut slot.starting_next);
            (slot.current.take().map(|run| (run, was_starting)), slot.epoch)
        };

        let mut stop_failure = None;
        if let Some((run, was_starting)) = outgoing {
            if was_starting {
                self.cancel_run(run, epoch)?;
            } else {
                stop_failure = self.stop_run(run);
            }
        }

        let started = {
            let _render = self.render.lock();
            let mut slot = self.slot.lock();
            if slot.epoch != epoch {
                debug!(manager = %self.name, epoch, "Transition superseded during teardown");
                // the newer transition may have resolved to nothing while this
                // one still owned the outgoing view
                let display = match slot.current {
                    None => slot.display.clone(),
                    Some(_) => None,
                };
                drop(slot);
                clear(display);
                return WaypointError::transition(stop_failure, None).map_or(Ok(()), Err);
            }
            match next {
                None => {
                    debug!(manager = %self.name, "No activity for place, clearing display");
                    let display = slot.display.clone();
                    drop(slot);
                    clear(display);
                    None
                }
                Some(activity) => {
                    slot.next_token += 1;
                    let token = slot.next_token;
                    let channel = ScopedBus::new(&self.bus);
                    slot.current = Some(Run {
                        token,
                        activity: activity.clone(),
                        channel: channel.clone(),
                    });
                    slot.starting_next = true;
                    Some((activity, token, channel))
                }
            }
        };

        let start_failure = started.and_then(|(activity, token, channel)| {
            let sink = GuardedSink::new(
                Arc::downgrade(&self.slot),
                self.render.clone(),
                token,
                self.name.clone(),
            );
            info!(manager = %self.name, activity = activity.name(), run = token, "Starting activity");
            activity.start(sink, channel).err().map(|source| {
                warn!(manager = %self.name, activity = activity.name(), run = token, error = %source, "Activity failed to start");
                WaypointError::activity_start(activity.name(), source)
            })
        });

        WaypointError::transition(stop_failure, start_failure).map_or(Ok(()), Err)
    }

    /// Stop a visible run. The failure, if any, is returned for aggregation.
    fn stop_run(&self, run: Run<V>) -> Option<WaypointError> {
        let name = run.activity.name();
        let severed = run.channel.remove_handlers();
        debug!(manager = %self.name, activity = name, run = run.token, severed, "Severed handlers before stop");

        if self.config.clear_display_on_stop {
            let _render = self.render.lock();
            let display = self.slot.lock().display.clone();
            clear(display);
        }

        info!(manager = %self.name, activity = name, run = run.token, "Stopping activity");
        let result = run.activity.on_stop();

        let late = self.retire_channel(&run.channel);
        if late > 0 {
            debug!(manager = %self.name, activity = name, run = run.token, late, "Severed handlers added during stop");
        }

        result.err().map(|source| {
            warn!(manager = %self.name, activity = name, run = run.token, error = %source, "Activity failed to stop");
            WaypointError::activity_stop(name, source)
        })
    }

    /// Cancel a run that never showed anything. On failure the run is put
    /// back as current and still starting, unless a newer transition has
    /// already taken over.
    fn cancel_run(&self, run: Run<V>, epoch: u64) -> Result<()> {
        info!(manager = %self.name, activity = run.activity.name(), run = run.token, "Cancelling activity");
        match run.activity.on_cancel() {
            Ok(()) => {
                let severed = self.retire_channel(&run.channel);
                debug!(manager = %self.name, activity = run.activity.name(), run = run.token, severed, "Severed handlers after cancel");
                Ok(())
            }
            Err(source) => {
                let err = WaypointError::activity_cancel(run.activity.name(), source);
                let mut slot = self.slot.lock();
                if slot.epoch == epoch && slot.current.is_none() {
                    slot.current = Some(run);
                    slot.starting_next = true;
                } else {
                    drop(slot);
                    self.retire_channel(&run.channel);
                }
                Err(err)
            }
        }
    }

    fn retire_channel(&self, channel: &ScopedBus) -> usize {
        if self.config.seal_retired_channels {
            channel.seal()
        } else {
            channel.remove_handlers()
        }
    }

    fn on_place_change_request(&self, event: &mut PlaceChangeRequestEvent<P>) -> Result<()> {
        let current = self
            .slot
            .lock()
            .current
            .as_ref()
            .map(|run| run.activity.clone());

        if let Some(activity) = current {
            let warning = activity
                .may_stop()
                .map_err(|source| WaypointError::may_stop(activity.name(), source))?;
            if let Some(warning) = warning.as_deref() {
                debug!(manager = %self.name, activity = activity.name(), warning, "Activity warned before leaving");
            }
            event.set_warning(warning);
        }
        Ok(())
    }
}

impl<P, V> Drop for ManagerInner<P, V> {
    fn drop(&mut self) {
        if let Some(registration) = self.registration.get_mut().take() {
            registration.remove();
        }
    }
}
