//! Activities and the manager that switches between them

pub mod builder;
pub mod manager;
pub mod mapper;
pub mod sink;
pub mod traits;

pub use builder::ActivityManagerBuilder;
pub use manager::ActivityManager;
pub use mapper::{ActivityMapper, CachingActivityMapper, FilteredActivityMapper};
pub use sink::GuardedSink;
pub use traits::{Activity, RenderTarget};

use std::sync::Arc;

/// Whether two handles point at the same activity instance
pub fn same_instance<V>(a: &Arc<dyn Activity<V>>, b: &Arc<dyn Activity<V>>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
