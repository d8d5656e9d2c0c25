//! Deferred, priority-ordered event bus
//!
//! `publish` only enqueues. `update` swaps the queue out under the queue lock,
//! stable-sorts the drained events by priority (equal priorities keep publish
//! order) and dispatches each one to a snapshot of its subscribers taken under
//! the listener lock. Listeners run with no lock held, so they may publish,
//! subscribe or unsubscribe freely; changes apply to later events.

use super::{Event, EventFilter, EventListener, EventPriority, EventType};
use crate::config::EventConfig;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone)]
struct Subscription {
    listener: Arc<dyn EventListener>,
    filter: Option<Arc<dyn EventFilter>>,
}

impl Subscription {
    fn is_listener(&self, address: *const ()) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.listener).cast::<()>(), address)
    }
}

/// Counters describing bus traffic since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventBusStats {
    /// Events accepted by `publish`
    pub published: u64,
    /// Events taken out of the queue (or published immediately) and dispatched
    pub dispatched: u64,
    /// Individual listener invocations
    pub deliveries: u64,
    /// Listener invocations that panicked
    pub listener_faults: u64,
}

/// Publish/subscribe hub shared by every system in a world
#[derive(Default)]
pub struct EventBus {
    queue: Mutex<Vec<Event>>,
    subscriptions: Mutex<HashMap<EventType, Vec<Subscription>>>,
    log_dispatch: AtomicBool,
    published: AtomicU64,
    dispatched: AtomicU64,
    deliveries: AtomicU64,
    listener_faults: AtomicU64,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus using the given settings
    pub fn with_config(config: &EventConfig) -> Self {
        let bus = Self::new();
        bus.set_log_dispatch(config.log_dispatch);
        bus
    }

    /// Log every dispatched event at debug level
    pub fn set_log_dispatch(&self, enabled: bool) {
        self.log_dispatch.store(enabled, Ordering::Relaxed);
    }

    /// Queue an event for the next [`EventBus::update`]
    pub fn publish(&self, event: Event) {
        self.queue.lock().push(event);
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Queue an event after overriding its priority
    pub fn publish_with_priority(&self, mut event: Event, priority: EventPriority) {
        event.set_priority(priority);
        self.publish(event);
    }

    /// Dispatch an event right now, bypassing the queue
    pub fn publish_immediate(&self, event: &Event) {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.dispatch(event);
    }

    /// Drain the queue and dispatch every event in priority order.
    ///
    /// Returns the number of events dispatched. Events published while
    /// draining wait for the next call.
    pub fn update(&self) -> usize {
        let mut events = std::mem::take(&mut *self.queue.lock());
        if events.is_empty() {
            return 0;
        }

        events.sort_by_key(Event::priority);
        for event in &events {
            self.dispatch(event);
        }
        events.len()
    }

    /// Subscribe a listener to one event type. Subscribing twice is a no-op.
    pub fn subscribe(&self, event_type: EventType, listener: Arc<dyn EventListener>) {
        self.add_subscription(event_type, Subscription { listener, filter: None });
    }

    /// Subscribe a listener that only receives events `filter` accepts
    pub fn subscribe_with_filter(
        &self,
        event_type: EventType,
        listener: Arc<dyn EventListener>,
        filter: impl EventFilter + 'static,
    ) {
        self.add_subscription(
            event_type,
            Subscription {
                listener,
                filter: Some(Arc::new(filter)),
            },
        );
    }

    /// Subscribe one listener to several types
    pub fn subscribe_to_multiple(&self, event_types: &[EventType], listener: &Arc<dyn EventListener>) {
        for &event_type in event_types {
            self.subscribe(event_type, Arc::clone(listener));
        }
    }

    /// Remove a listener from one event type
    pub fn unsubscribe<L: EventListener + ?Sized>(&self, event_type: EventType, listener: &Arc<L>) -> bool {
        let address = Arc::as_ptr(listener).cast::<()>();
        let mut subscriptions = self.subscriptions.lock();
        let Some(list) = subscriptions.get_mut(&event_type) else {
            return false;
        };

        let before = list.len();
        list.retain(|sub| !sub.is_listener(address));
        let removed = list.len() != before;
        if list.is_empty() {
            subscriptions.remove(&event_type);
        }
        removed
    }

    /// Remove a listener from every event type
    pub fn unsubscribe_all<L: EventListener + ?Sized>(&self, listener: &Arc<L>) {
        let address = Arc::as_ptr(listener).cast::<()>();
        let mut subscriptions = self.subscriptions.lock();
        for list in subscriptions.values_mut() {
            list.retain(|sub| !sub.is_listener(address));
        }
        subscriptions.retain(|_, list| !list.is_empty());
    }

    /// Number of listeners subscribed to a type
    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.subscriptions.lock().get(&event_type).map_or(0, Vec::len)
    }

    /// Events waiting for the next update
    pub fn pending_count(&self) -> usize {
        self.queue.lock().len()
    }

    /// Drop every queued event
    pub fn clear_pending(&self) {
        self.queue.lock().clear();
    }

    /// Drop every queued event and every subscription
    pub fn clear(&self) {
        self.clear_pending();
        self.subscriptions.lock().clear();
    }

    /// Traffic counters
    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            published: self.published.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            listener_faults: self.listener_faults.load(Ordering::Relaxed),
        }
    }

    fn add_subscription(&self, event_type: EventType, subscription: Subscription) {
        let address = Arc::as_ptr(&subscription.listener).cast::<()>();
        let mut subscriptions = self.subscriptions.lock();
        let list = subscriptions.entry(event_type).or_default();
        if list.iter().any(|sub| sub.is_listener(address)) {
            log::debug!("[EventBus] Listener already subscribed to {event_type:?}");
            return;
        }
        list.push(subscription);
    }

    fn dispatch(&self, event: &Event) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        if self.log_dispatch.load(Ordering::Relaxed) {
            log::debug!("[EventBus] Dispatching {:?} ({:?})", event.event_type(), event.priority());
        }

        let snapshot: Vec<Subscription> = match self.subscriptions.lock().get(&event.event_type()) {
            Some(list) => list.clone(),
            None => return,
        };

        for subscription in &snapshot {
            if let Some(filter) = &subscription.filter {
                if !filter.accepts(event) {
                    continue;
                }
            }

            self.deliveries.fetch_add(1, Ordering::Relaxed);
            let outcome = catch_unwind(AssertUnwindSafe(|| subscription.listener.on_event(event)));
            if let Err(panic) = outcome {
                self.listener_faults.fetch_add(1, Ordering::Relaxed);
                log::error!(
                    "[EventBus] Listener failed while handling {:?}: {}",
                    event.event_type(),
                    panic_message(panic.as_ref())
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
