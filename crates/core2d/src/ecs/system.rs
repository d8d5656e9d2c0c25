//! System trait and implementations

use crate::ecs::World;

/// A unit of per-tick game logic.
///
/// Systems never hold on to the [`World`]; they receive it for the duration
/// of each call instead.
pub trait System {
    /// Stable name, unique within one scheduler
    fn name(&self) -> &str;

    /// Called once when the system is added to a world
    fn initialize(&mut self, _world: &mut World) {}

    /// Run one tick
    fn update(&mut self, world: &mut World, delta_time: f32);

    /// Called once when the system is removed or the world is torn down
    fn shutdown(&mut self, _world: &mut World) {}
}

/// Adapter turning a closure into a [`System`]
pub struct FnSystem<F> {
    name: String,
    run: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut World, f32),
{
    /// Wrap `run` under the given name
    pub fn new(name: impl Into<String>, run: F) -> Self {
        Self { name: name.into(), run }
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut World, f32),
{
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, world: &mut World, delta_time: f32) {
        (self.run)(world, delta_time);
    }
}
