//! Activity and render target traits

use crate::activity::sink::GuardedSink;
use crate::bus::ScopedBus;

/// Receives the view produced by an activity. `None` clears it.
///
/// Writes are serialized by the manager. `set_content` may call back into the
/// manager or fire place changes on the same thread.
pub trait RenderTarget<V>: Send + Sync {
    fn set_content(&self, content: Option<V>);
}

/// A cancelable unit of work bound to one place.
///
/// `start` may finish asynchronously: the activity keeps the sink and writes
/// its view through it whenever it is ready. Once superseded, anything it
/// writes through that sink is discarded.
pub trait Activity<V>: Send + Sync {
    /// Start the activity. Handlers it needs go through `bus`; they are
    /// severed when the run ends.
    fn start(&self, panel: GuardedSink<V>, bus: ScopedBus) -> anyhow::Result<()>;

    /// Called when a visible activity is replaced
    fn on_stop(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called instead of `on_stop` when the activity is replaced before it
    /// showed anything
    fn on_cancel(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// A warning to show the user before leaving, or `None` to leave quietly
    fn may_stop(&self) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
