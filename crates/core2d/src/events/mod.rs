//! Event system
//!
//! Deferred publish/subscribe with priority-ordered delivery:
//! - Events are queued by `publish` and delivered on the next `update`
//! - Within one drain, more urgent events are delivered first; ties keep publish order
//! - Only listeners subscribed to an event's type are notified
//! - Filters compose into arbitrary predicates over events

mod bus;
mod event;
mod filter;
mod listener;

pub use bus::{EventBus, EventBusStats};
pub use event::{Event, EventPayload, EventPriority, EventType};
pub use filter::{AllowAllFilter, AndFilter, BlockAllFilter, EventFilter, NotFilter, OrFilter, PriorityFilter, TypeFilter};
pub use listener::{EventListener, FilteredListener, FnListener};
