//! Shared doubles for activity manager integration tests.
#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use waypoint::{
    Activity, ActivityManager, ActivityMapper, EventBus, GuardedSink, HandlerRegistration,
    PlaceChangeEvent, RenderTarget, ScopedBus,
};

pub type Place = &'static str;

/// Ordered log of every lifecycle call made on the recorders of one test
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Notification an activity can subscribe to through its channel
#[derive(Debug)]
pub struct Refresh;

/// Render target that records every write
#[derive(Default)]
pub struct Screen {
    writes: Mutex<Vec<Option<String>>>,
}

impl Screen {
    pub fn writes(&self) -> Vec<Option<String>> {
        self.writes.lock().clone()
    }

    pub fn last(&self) -> Option<Option<String>> {
        self.writes.lock().last().cloned()
    }
}

impl RenderTarget<String> for Screen {
    fn set_content(&self, content: Option<String>) {
        self.writes.lock().push(content);
    }
}

/// Activity double that logs its lifecycle and can be told to misbehave
pub struct Recorder {
    name: &'static str,
    log: CallLog,
    bus: EventBus,
    show_on_start: bool,
    subscribe_on_start: bool,
    subscribe_on_stop: bool,
    refresh_on_start: bool,
    fail_start: bool,
    fail_stop: bool,
    fail_cancel: bool,
    fail_may_stop: bool,
    warning: Option<&'static str>,
    navigate_on_start: Option<Place>,
    navigate_on_stop: Option<Place>,
    navigate_on_cancel: Option<Place>,
    panel: Mutex<Option<GuardedSink<String>>>,
    channel: Mutex<Option<ScopedBus>>,
}

impl Recorder {
    pub fn new(name: &'static str, log: &CallLog, bus: &EventBus) -> Self {
        Self {
            name,
            log: log.clone(),
            bus: bus.clone(),
            show_on_start: false,
            subscribe_on_start: false,
            subscribe_on_stop: false,
            refresh_on_start: false,
            fail_start: false,
            fail_stop: false,
            fail_cancel: false,
            fail_may_stop: false,
            warning: None,
            navigate_on_start: None,
            navigate_on_stop: None,
            navigate_on_cancel: None,
            panel: Mutex::new(None),
            channel: Mutex::new(None),
        }
    }

    /// Show its view synchronously from `start`
    pub fn visible(mut self) -> Self {
        self.show_on_start = true;
        self
    }

    pub fn subscribing(mut self) -> Self {
        self.subscribe_on_start = true;
        self
    }

    pub fn subscribing_on_stop(mut self) -> Self {
        self.subscribe_on_stop = true;
        self
    }

    /// Fire `Refresh` on the shared bus from inside `start`
    pub fn refreshing_on_start(mut self) -> Self {
        self.refresh_on_start = true;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn failing_cancel(mut self) -> Self {
        self.fail_cancel = true;
        self
    }

    pub fn failing_may_stop(mut self) -> Self {
        self.fail_may_stop = true;
        self
    }

    pub fn warning(mut self, warning: &'static str) -> Self {
        self.warning = Some(warning);
        self
    }

    pub fn navigating_on_start(mut self, place: Place) -> Self {
        self.navigate_on_start = Some(place);
        self
    }

    pub fn navigating_on_stop(mut self, place: Place) -> Self {
        self.navigate_on_stop = Some(place);
        self
    }

    pub fn navigating_on_cancel(mut self, place: Place) -> Self {
        self.navigate_on_cancel = Some(place);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Write through the sink from the most recent `start`
    pub fn show(&self, content: &str) {
        if let Some(panel) = self.panel.lock().as_ref() {
            panel.set_content(Some(content.to_string()));
        }
    }

    pub fn panel(&self) -> Option<GuardedSink<String>> {
        self.panel.lock().clone()
    }

    /// Subscribe through the channel from the most recent `start`
    pub fn late_subscribe(&self) -> waypoint::Result<HandlerRegistration> {
        let channel = self
            .channel
            .lock()
            .clone()
            .ok_or_else(|| waypoint::WaypointError::internal("never started"))?;
        self.subscribe(&channel)
    }

    fn subscribe(&self, channel: &ScopedBus) -> waypoint::Result<HandlerRegistration> {
        let log = self.log.clone();
        let name = self.name;
        channel.add_handler(move |_: &mut Refresh| {
            log.push(format!("{name}:refresh"));
            Ok(())
        })
    }

    fn navigate(&self, place: Option<Place>) -> anyhow::Result<()> {
        if let Some(place) = place {
            self.bus.fire(&mut PlaceChangeEvent::new(place))?;
        }
        Ok(())
    }
}

impl Activity<String> for Recorder {
    fn start(&self, panel: GuardedSink<String>, bus: ScopedBus) -> anyhow::Result<()> {
        self.log.push(format!("{}:start", self.name));
        *self.panel.lock() = Some(panel.clone());
        *self.channel.lock() = Some(bus.clone());

        if self.subscribe_on_start {
            self.subscribe(&bus)?;
        }
        if self.refresh_on_start {
            self.bus.fire(&mut Refresh)?;
        }
        self.navigate(self.navigate_on_start)?;
        if self.show_on_start {
            panel.set_content(Some(self.name.to_string()));
        }
        if self.fail_start {
            anyhow::bail!("{} could not start", self.name);
        }
        Ok(())
    }

    fn on_stop(&self) -> anyhow::Result<()> {
        self.log.push(format!("{}:stop", self.name));
        if self.subscribe_on_stop {
            let channel = self.channel.lock().clone();
            if let Some(channel) = channel {
                self.subscribe(&channel)?;
            }
        }
        self.navigate(self.navigate_on_stop)?;
        if self.fail_stop {
            anyhow::bail!("{} could not stop", self.name);
        }
        Ok(())
    }

    fn on_cancel(&self) -> anyhow::Result<()> {
        self.log.push(format!("{}:cancel", self.name));
        self.navigate(self.navigate_on_cancel)?;
        if self.fail_cancel {
            anyhow::bail!("{} could not cancel", self.name);
        }
        Ok(())
    }

    fn may_stop(&self) -> anyhow::Result<Option<String>> {
        if self.fail_may_stop {
            anyhow::bail!("{} could not decide", self.name);
        }
        Ok(self.warning.map(str::to_string))
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Mapper over a fixed table; places missing from it map to no activity
pub fn table(entries: Vec<(Place, Arc<Recorder>)>) -> impl ActivityMapper<Place, String> {
    let entries: HashMap<Place, Arc<dyn Activity<String>>> = entries
        .into_iter()
        .map(|(place, recorder)| (place, recorder as Arc<dyn Activity<String>>))
        .collect();
    move |place: &Place| -> Option<Arc<dyn Activity<String>>> { entries.get(place).cloned() }
}

/// A manager wired to `bus` with a screen attached
pub fn attached(
    bus: &EventBus,
    entries: Vec<(Place, Arc<Recorder>)>,
) -> (ActivityManager<Place, String>, Arc<Screen>) {
    let manager = ActivityManager::new(table(entries), bus.clone());
    let screen = Arc::new(Screen::default());
    manager.set_display(Some(screen.clone()));
    (manager, screen)
}

/// Fire a confirmed place change on the bus
pub fn go(bus: &EventBus, place: Place) -> waypoint::Result<()> {
    bus.fire(&mut PlaceChangeEvent::new(place))
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
