//! # core2d
//!
//! Run-time core of a 2D game engine: entities and components, a
//! priority-ordered system scheduler, a deferred event bus with filters, and
//! interchangeable spatial indexes for proximity queries.
//!
//! ## Features
//!
//! - **ECS Architecture**: generation-checked entity handles and per-type component tables
//! - **System Scheduling**: stable priority order with per-system pause and resume
//! - **Event Bus**: priority-sorted deferred delivery with composable filters
//! - **Spatial Indexing**: quad-tree and uniform grid behind one trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use core2d::prelude::*;
//!
//! struct Velocity(Vec2);
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = CoreConfig::load_from_file("core.toml")?;
//!     let mut world = World::with_config(&config);
//!
//!     let ship = world.create_entity(Some("ship"));
//!     world.components_mut().add(ship, Velocity(Vec2::new(1.0, 0.0)));
//!     world.add_system(
//!         Box::new(FnSystem::new("drift", |world: &mut World, dt: f32| {
//!             world.components_mut().for_each_mut::<Velocity>(|_, v| v.0 *= 1.0 - dt);
//!         })),
//!         0,
//!     );
//!
//!     world.update(1.0 / 60.0);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::must_use_candidate)]

pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, CoreConfig, EventConfig, WorldConfig},
        ecs::{Component, ComponentStore, Entity, FnSystem, System, World},
        events::{
            Event, EventBus, EventFilter, EventListener, EventPriority, EventType, FnListener, PriorityFilter,
            TypeFilter,
        },
        foundation::{
            math::{Rect, Vec2},
            time::{FrameClock, Stopwatch},
        },
        spatial::{create_spatial_index, SpatialConfig, SpatialIndex, SpatialIndexKind},
    };
}
