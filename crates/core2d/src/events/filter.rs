//! Composable event predicates
//!
//! Every filter is a pure function of an event. Composite filters own their
//! children exclusively.

use super::{Event, EventPriority, EventType};
use std::collections::HashSet;

/// Predicate deciding whether an event is delivered
pub trait EventFilter: Send + Sync {
    /// Return true to accept the event
    fn accepts(&self, event: &Event) -> bool;
}

impl<F> EventFilter for F
where
    F: Fn(&Event) -> bool + Send + Sync,
{
    fn accepts(&self, event: &Event) -> bool {
        self(event)
    }
}

/// Accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllFilter;

impl EventFilter for AllowAllFilter {
    fn accepts(&self, _event: &Event) -> bool {
        true
    }
}

/// Rejects everything
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockAllFilter;

impl EventFilter for BlockAllFilter {
    fn accepts(&self, _event: &Event) -> bool {
        false
    }
}

/// Accepts events whose type is on the allow-list
#[derive(Debug, Clone, Default)]
pub struct TypeFilter {
    allowed: HashSet<EventType>,
}

impl TypeFilter {
    /// Allow exactly these types
    pub fn new(types: impl IntoIterator<Item = EventType>) -> Self {
        Self {
            allowed: types.into_iter().collect(),
        }
    }

    /// Add a type to the allow-list
    pub fn allow(&mut self, event_type: EventType) {
        self.allowed.insert(event_type);
    }
}

impl EventFilter for TypeFilter {
    fn accepts(&self, event: &Event) -> bool {
        self.allowed.contains(&event.event_type())
    }
}

/// Accepts events at least as urgent as the threshold
#[derive(Debug, Clone, Copy)]
pub struct PriorityFilter {
    threshold: EventPriority,
}

impl PriorityFilter {
    /// Accept `threshold` and anything more urgent
    pub fn new(threshold: EventPriority) -> Self {
        Self { threshold }
    }
}

impl EventFilter for PriorityFilter {
    fn accepts(&self, event: &Event) -> bool {
        event.priority().is_at_least(self.threshold)
    }
}

/// Accepts when every child accepts. An empty `AndFilter` accepts everything.
#[derive(Default)]
pub struct AndFilter {
    filters: Vec<Box<dyn EventFilter>>,
}

impl AndFilter {
    /// Combine the given filters
    pub fn new(filters: Vec<Box<dyn EventFilter>>) -> Self {
        Self { filters }
    }

    /// Add another child (builder pattern)
    pub fn with(mut self, filter: impl EventFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl EventFilter for AndFilter {
    fn accepts(&self, event: &Event) -> bool {
        self.filters.iter().all(|f| f.accepts(event))
    }
}

/// Accepts when any child accepts. An empty `OrFilter` rejects everything.
#[derive(Default)]
pub struct OrFilter {
    filters: Vec<Box<dyn EventFilter>>,
}

impl OrFilter {
    /// Combine the given filters
    pub fn new(filters: Vec<Box<dyn EventFilter>>) -> Self {
        Self { filters }
    }

    /// Add another child (builder pattern)
    pub fn with(mut self, filter: impl EventFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl EventFilter for OrFilter {
    fn accepts(&self, event: &Event) -> bool {
        self.filters.iter().any(|f| f.accepts(event))
    }
}

/// Inverts its child
pub struct NotFilter {
    inner: Box<dyn EventFilter>,
}

impl NotFilter {
    /// Negate `inner`
    pub fn new(inner: impl EventFilter + 'static) -> Self {
        Self { inner: Box::new(inner) }
    }
}

impl EventFilter for NotFilter {
    fn accepts(&self, event: &Event) -> bool {
        !self.inner.accepts(event)
    }
}
