//! Event records

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    /// An entity was created
    EntityCreated,
    /// An entity was destroyed
    EntityDestroyed,
    /// A component was attached to an entity
    ComponentAdded,
    /// A component was detached from an entity
    ComponentRemoved,
    /// Two entities started overlapping
    CollisionStarted,
    /// Two entities stopped overlapping
    CollisionEnded,
    /// An entity took damage
    DamageTaken,
    /// An entity died
    EntityDied,
    /// An item was picked up
    ItemPickedUp,
    /// A mapped input action fired
    InputAction,
    /// A scene finished loading
    SceneLoaded,
    /// A scene was unloaded
    SceneUnloaded,
    /// The game was paused
    GamePaused,
    /// The game was resumed
    GameResumed,
    /// Game-defined event; the value is the game's own sub-type
    Custom(u32),
}

/// Delivery priority. Lower variants are more urgent and dispatch first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventPriority {
    /// Must be handled before anything else this drain
    Critical = 0,
    /// Handled before ordinary traffic
    High = 1,
    /// Ordinary traffic
    #[default]
    Medium = 2,
    /// Handled last
    Low = 3,
}

impl EventPriority {
    /// True when `self` is as urgent as `threshold` or more
    pub fn is_at_least(self, threshold: EventPriority) -> bool {
        self <= threshold
    }
}

/// Opaque payload shared by every subscriber of one event
pub type EventPayload = Arc<dyn Any + Send + Sync>;

/// Event with type, priority, creation time and optional payload
#[derive(Clone)]
pub struct Event {
    event_type: EventType,
    priority: EventPriority,
    timestamp: Instant,
    payload: Option<EventPayload>,
}

impl Event {
    /// Create an event of the given type at medium priority
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            priority: EventPriority::default(),
            timestamp: Instant::now(),
            payload: None,
        }
    }

    /// Create a game-defined event
    pub fn custom(sub_type: u32) -> Self {
        Self::new(EventType::Custom(sub_type))
    }

    /// Set the priority (builder pattern)
    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Attach a payload (builder pattern)
    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Attach an already shared payload
    pub fn with_shared_payload(mut self, payload: EventPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Type of event
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Game-defined sub-type for [`EventType::Custom`] events
    pub fn custom_type(&self) -> Option<u32> {
        match self.event_type {
            EventType::Custom(sub_type) => Some(sub_type),
            _ => None,
        }
    }

    /// Delivery priority
    pub fn priority(&self) -> EventPriority {
        self.priority
    }

    /// When the event was created
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Borrow the payload as `T`, if present and of that type
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    /// Shared handle to the raw payload
    pub fn shared_payload(&self) -> Option<&EventPayload> {
        self.payload.as_ref()
    }

    pub(crate) fn set_priority(&mut self, priority: EventPriority) {
        self.priority = priority;
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("priority", &self.priority)
            .field("has_payload", &self.payload.is_some())
            .finish_non_exhaustive()
    }
}
