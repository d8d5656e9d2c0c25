//! Entity-Component-System implementation
//!
//! Entities are generation-checked handles, components live in per-type
//! tables, and systems run once per tick in priority order against a
//! [`World`] that owns all of it.

pub mod component;
pub mod entity;
pub mod scheduler;
pub mod storage;
pub mod system;
pub mod world;

#[cfg(test)]
mod tests;

pub use component::Component;
pub use entity::{Entity, EntityRegistry};
pub use scheduler::SystemScheduler;
pub use storage::ComponentStore;
pub use system::{FnSystem, System};
pub use world::World;
