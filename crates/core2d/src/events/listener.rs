//! Event listeners

use super::{Event, EventFilter};

/// Receives dispatched events.
///
/// Listeners are shared (`Arc`) between the bus and the code that created
/// them, so `on_event` takes `&self`; keep mutable state behind a lock or an
/// atomic.
pub trait EventListener: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &Event);
}

/// Listener that forwards only the events its filter accepts
pub struct FilteredListener<L> {
    filter: Box<dyn EventFilter>,
    inner: L,
}

impl<L: EventListener> FilteredListener<L> {
    /// Wrap `inner` behind `filter`
    pub fn new(inner: L, filter: impl EventFilter + 'static) -> Self {
        Self {
            filter: Box::new(filter),
            inner,
        }
    }

    /// Replace the filter
    pub fn set_filter(&mut self, filter: impl EventFilter + 'static) {
        self.filter = Box::new(filter);
    }

    /// The wrapped listener
    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L: EventListener> EventListener for FilteredListener<L> {
    fn on_event(&self, event: &Event) {
        if self.filter.accepts(event) {
            self.inner.on_event(event);
        }
    }
}

/// Adapter turning a closure into an [`EventListener`]
pub struct FnListener<F>(F);

impl<F> FnListener<F>
where
    F: Fn(&Event) + Send + Sync,
{
    /// Wrap `handler`
    pub fn new(handler: F) -> Self {
        Self(handler)
    }
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        (self.0)(event);
    }
}
