//! ECS World implementation
//!
//! The world owns the entity registry, component store, system scheduler,
//! event bus and (optionally) a spatial index, and drives them once per tick.

use super::{ComponentStore, Entity, EntityRegistry, System, SystemScheduler};
use crate::config::CoreConfig;
use crate::events::{Event, EventBus, EventType};
use crate::spatial::{create_spatial_index, SpatialIndex};
use std::time::Duration;

use crate::foundation::time::Stopwatch;

/// ECS World containing all entities, components, systems and events
pub struct World {
    entities: EntityRegistry,
    components: ComponentStore,
    scheduler: SystemScheduler,
    events: EventBus,
    spatial: Option<Box<dyn SpatialIndex>>,
    paused: bool,
    frame_count: u64,
    elapsed_time: f64,
    scene_name: String,
    last_update: Duration,
}

impl World {
    /// Create a new world without a spatial index
    pub fn new() -> Self {
        Self {
            entities: EntityRegistry::new(),
            components: ComponentStore::new(),
            scheduler: SystemScheduler::new(),
            events: EventBus::new(),
            spatial: None,
            paused: false,
            frame_count: 0,
            elapsed_time: 0.0,
            scene_name: String::new(),
            last_update: Duration::ZERO,
        }
    }

    /// Create a world from configuration, building its spatial index if one is configured
    pub fn with_config(config: &CoreConfig) -> Self {
        let world_config = &config.world;
        let mut world = Self::new();
        world.events = EventBus::with_config(&config.events);
        world.scene_name.clone_from(&world_config.scene_name);
        world.spatial = world_config
            .spatial
            .as_ref()
            .map(|spatial| create_spatial_index(spatial.kind, world_config.world_bounds, spatial));
        log::info!(
            "[World] Created scene '{}' with {}",
            world.scene_name,
            if world.spatial.is_some() { "a spatial index" } else { "no spatial index" }
        );
        world
    }

    /// Advance one tick.
    ///
    /// A paused world skips the tick entirely: no events are delivered, no
    /// system sees the elapsed time and the frame counter does not move.
    pub fn update(&mut self, delta_time: f32) {
        if self.paused {
            return;
        }

        let mut stopwatch = Stopwatch::new();
        stopwatch.start();

        self.events.update();
        SystemScheduler::run(self, delta_time);
        self.shutdown_retired();

        self.frame_count += 1;
        self.elapsed_time += f64::from(delta_time);
        stopwatch.stop();
        self.last_update = stopwatch.elapsed();
    }

    /// Stop ticking until [`World::resume`]
    pub fn pause(&mut self) {
        if !self.paused {
            log::info!("[World] Paused at frame {}", self.frame_count);
        }
        self.paused = true;
    }

    /// Resume ticking
    pub fn resume(&mut self) {
        if self.paused {
            log::info!("[World] Resumed at frame {}", self.frame_count);
        }
        self.paused = false;
    }

    /// Whether the world is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Create a new entity and announce it with [`EventType::EntityCreated`]
    pub fn create_entity(&mut self, name: Option<&str>) -> Entity {
        let entity = self.entities.create(name);
        self.events.publish(Event::new(EventType::EntityCreated).with_payload(entity));
        entity
    }

    /// Destroy an entity, dropping its components and spatial entry.
    ///
    /// Publishes [`EventType::EntityDestroyed`]. Returns false for handles
    /// that are not alive.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.destroy(entity) {
            log::warn!("[World] Cannot destroy invalid entity {entity}");
            return false;
        }
        self.components.remove_entity(entity);
        if let Some(spatial) = self.spatial.as_mut() {
            spatial.remove(entity);
        }
        self.events.publish(Event::new(EventType::EntityDestroyed).with_payload(entity));
        true
    }

    /// Register a system and run its `initialize` hook
    pub fn add_system(&mut self, mut system: Box<dyn System>, priority: i32) -> bool {
        if self.scheduler.has_system(system.name()) {
            log::warn!("[World] System '{}' already registered, ignoring", system.name());
            return false;
        }
        system.initialize(self);
        log::debug!("[World] Added system '{}' at priority {priority}", system.name());
        self.scheduler.add_system(system, priority)
    }

    /// Remove a system and run its `shutdown` hook
    pub fn remove_system(&mut self, name: &str) -> bool {
        let removed = self.scheduler.remove_system(name);
        self.shutdown_retired();
        removed
    }

    /// Shut down every system and remove it from the schedule
    pub fn shutdown_systems(&mut self) {
        self.scheduler.clear();
        self.shutdown_retired();
    }

    /// Drop every entity, component, spatial entry and pending event. Systems stay.
    pub fn clear(&mut self) {
        self.entities.clear_all();
        self.components.clear();
        if let Some(spatial) = self.spatial.as_mut() {
            spatial.clear();
        }
        self.events.clear_pending();
    }

    fn shutdown_retired(&mut self) {
        for mut system in self.scheduler.take_retired() {
            log::debug!("[World] Shutting down system '{}'", system.name());
            system.shutdown(self);
        }
    }

    /// Entity registry
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    /// Component store
    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    /// Mutable component store
    pub fn components_mut(&mut self) -> &mut ComponentStore {
        &mut self.components
    }

    /// System scheduler
    pub fn scheduler(&self) -> &SystemScheduler {
        &self.scheduler
    }

    /// Mutable system scheduler
    pub fn scheduler_mut(&mut self) -> &mut SystemScheduler {
        &mut self.scheduler
    }

    /// Event bus. Publishing only needs a shared reference.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Spatial index, if one was configured
    pub fn spatial(&self) -> Option<&dyn SpatialIndex> {
        self.spatial.as_deref()
    }

    /// Mutable spatial index, if one was configured
    pub fn spatial_mut(&mut self) -> Option<&mut (dyn SpatialIndex + 'static)> {
        self.spatial.as_deref_mut()
    }

    /// Install (or replace) the spatial index
    pub fn set_spatial(&mut self, spatial: Box<dyn SpatialIndex>) {
        self.spatial = Some(spatial);
    }

    /// Component store and spatial index borrowed together, for sync systems
    pub fn components_and_spatial_mut(&mut self) -> (&mut ComponentStore, Option<&mut (dyn SpatialIndex + 'static)>) {
        (&mut self.components, self.spatial.as_deref_mut())
    }

    /// Frames ticked so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total simulated seconds
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Wall time spent in the most recent tick
    pub fn last_update_duration(&self) -> Duration {
        self.last_update
    }

    /// Current scene name tag
    pub fn scene_name(&self) -> &str {
        &self.scene_name
    }

    /// Set the scene name tag
    pub fn set_scene_name(&mut self, name: impl Into<String>) {
        self.scene_name = name.into();
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.shutdown_systems();
    }
}
