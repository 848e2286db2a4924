//! Navigation events consumed by the activity manager
//!
//! The place store fires a [`PlaceChangeRequestEvent`] before leaving the
//! current place and a [`PlaceChangeEvent`] once the change is confirmed.

/// The current place has changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceChangeEvent<P> {
    new_place: P,
}

impl<P> PlaceChangeEvent<P> {
    pub fn new(new_place: P) -> Self {
        Self { new_place }
    }

    pub fn new_place(&self) -> &P {
        &self.new_place
    }
}

/// The place is about to change. Handlers may attach a warning; the place
/// store decides what to do with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceChangeRequestEvent<P> {
    new_place: P,
    warning: Option<String>,
}

impl<P> PlaceChangeRequestEvent<P> {
    pub fn new(new_place: P) -> Self {
        Self {
            new_place,
            warning: None,
        }
    }

    pub fn new_place(&self) -> &P {
        &self.new_place
    }

    /// Store a warning. `None` keeps whatever an earlier handler set.
    pub fn set_warning(&mut self, warning: Option<String>) {
        if warning.is_some() {
            self.warning = warning;
        }
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_does_not_clear_warning() {
        let mut request = PlaceChangeRequestEvent::new("inbox");
        request.set_warning(Some("unsaved draft".to_string()));
        request.set_warning(None);
        assert_eq!(request.warning(), Some("unsaved draft"));
        assert_eq!(request.new_place(), &"inbox");
    }

    #[test]
    fn test_later_warning_wins() {
        let mut request = PlaceChangeRequestEvent::new(3u32);
        request.set_warning(Some("first".to_string()));
        request.set_warning(Some("second".to_string()));
        assert_eq!(request.warning(), Some("second"));
    }
}
