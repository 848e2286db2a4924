//! Place to activity lookup

use crate::activity::traits::Activity;
use parking_lot::Mutex;
use std::sync::Arc;

/// Finds the activity for a place. `None` means nothing should run there.
pub trait ActivityMapper<P, V>: Send + Sync {
    fn activity_for(&self, place: &P) -> Option<Arc<dyn Activity<V>>>;
}

impl<P, V, F> ActivityMapper<P, V> for F
where
    F: Fn(&P) -> Option<Arc<dyn Activity<V>>> + Send + Sync,
{
    fn activity_for(&self, place: &P) -> Option<Arc<dyn Activity<V>>> {
        self(place)
    }
}

/// Remembers the last place it was asked about and hands back the same
/// activity instance while the place stays equal.
pub struct CachingActivityMapper<P, V, M> {
    inner: M,
    last: Mutex<Option<(P, Option<Arc<dyn Activity<V>>>)>>,
}

impl<P, V, M> CachingActivityMapper<P, V, M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            last: Mutex::new(None),
        }
    }
}

impl<P, V, M> ActivityMapper<P, V> for CachingActivityMapper<P, V, M>
where
    P: PartialEq + Clone + Send + Sync,
    M: ActivityMapper<P, V>,
{
    fn activity_for(&self, place: &P) -> Option<Arc<dyn Activity<V>>> {
        let mut last = self.last.lock();
        if let Some((last_place, activity)) = last.as_ref() {
            if last_place == place {
                return activity.clone();
            }
        }
        let activity = self.inner.activity_for(place);
        *last = Some((place.clone(), activity.clone()));
        activity
    }
}

/// Rewrites the place before delegating, e.g. to collapse several places onto
/// one activity.
pub struct FilteredActivityMapper<M, F> {
    inner: M,
    filter: F,
}

impl<M, F> FilteredActivityMapper<M, F> {
    pub fn new(filter: F, inner: M) -> Self {
        Self { inner, filter }
    }
}

impl<P, V, M, F> ActivityMapper<P, V> for FilteredActivityMapper<M, F>
where
    M: ActivityMapper<P, V>,
    F: Fn(&P) -> P + Send + Sync,
{
    fn activity_for(&self, place: &P) -> Option<Arc<dyn Activity<V>>> {
        self.inner.activity_for(&(self.filter)(place))
    }
}
