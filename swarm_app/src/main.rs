//! Swarm Demo
//!
//! Headless demo of the core: a swarm of drifting ships kept in a spatial
//! index, a proximity system that publishes close-encounter events and a
//! listener that counts them. Pass a `.toml` or `.ron` config path as the
//! first argument to override the defaults.

use core2d::foundation::logging::{self, LevelFilter};
use core2d::prelude::*;
use core2d::spatial::{QuadTree, SpatialGrid};
use rand::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Simulation settings
const NUM_SHIPS: usize = 200;
const NUM_FRAMES: u64 = 240;
const PAUSE_AT_FRAME: u64 = 120;
const PAUSED_FRAMES: u32 = 30;
const TARGET_FRAME_TIME: Duration = Duration::from_millis(4);

const SHIP_RADIUS: f32 = 4.0;
const MAX_SHIP_SPEED: f32 = 60.0;
const ENCOUNTER_RADIUS: f32 = 12.0;

/// Sub-type of the custom event published for every close pair
const CLOSE_ENCOUNTER: u32 = 1;

#[derive(Debug, Clone, Copy)]
struct Position(Vec2);

#[derive(Debug, Clone, Copy)]
struct Velocity(Vec2);

/// Moves ships and bounces them off the world edges
struct MovementSystem {
    bounds: Rect,
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn update(&mut self, world: &mut World, delta_time: f32) {
        let movers = world.components().entities_with2::<Position, Velocity>();
        let components = world.components_mut();

        for entity in movers {
            let Some(mut velocity) = components.get::<Velocity>(entity).copied() else {
                continue;
            };
            let Some(position) = components.get_mut::<Position>(entity) else {
                continue;
            };

            position.0 += velocity.0 * delta_time;
            if position.0.x < self.bounds.min.x || position.0.x > self.bounds.max.x {
                velocity.0.x = -velocity.0.x;
            }
            if position.0.y < self.bounds.min.y || position.0.y > self.bounds.max.y {
                velocity.0.y = -velocity.0.y;
            }
            position.0.x = position.0.x.clamp(self.bounds.min.x, self.bounds.max.x);
            position.0.y = position.0.y.clamp(self.bounds.min.y, self.bounds.max.y);
            components.add(entity, velocity);
        }
    }
}

/// Pushes every ship's bounding box into the spatial index
struct SpatialSyncSystem;

impl System for SpatialSyncSystem {
    fn name(&self) -> &str {
        "spatial_sync"
    }

    fn update(&mut self, world: &mut World, _delta_time: f32) {
        let (components, spatial) = world.components_and_spatial_mut();
        let Some(spatial) = spatial else {
            return;
        };
        components.for_each::<Position>(|entity, position| {
            spatial.update(entity, Rect::around(position.0, SHIP_RADIUS));
        });
    }
}

/// Publishes a close-encounter event for each pair of ships within range
#[derive(Default)]
struct ProximitySystem {
    pairs_last_frame: usize,
}

impl System for ProximitySystem {
    fn name(&self) -> &str {
        "proximity"
    }

    fn initialize(&mut self, world: &mut World) {
        if world.spatial().is_none() {
            log::warn!("[Proximity] No spatial index configured, encounters will not be detected");
        }
    }

    fn update(&mut self, world: &mut World, _delta_time: f32) {
        let Some(spatial) = world.spatial() else {
            return;
        };

        let mut pairs = Vec::new();
        for entity in world.components().entities_with::<Position>() {
            pairs.extend(
                spatial
                    .nearby(entity, ENCOUNTER_RADIUS)
                    .into_iter()
                    .filter(|&other| entity < other)
                    .map(|other| (entity, other)),
            );
        }

        self.pairs_last_frame = pairs.len();
        for pair in pairs {
            world
                .events()
                .publish(Event::custom(CLOSE_ENCOUNTER).with_priority(EventPriority::Low).with_payload(pair));
        }
    }

    fn shutdown(&mut self, _world: &mut World) {
        log::info!("[Proximity] Last frame had {} close pairs", self.pairs_last_frame);
    }
}

fn load_config() -> Result<CoreConfig, ConfigError> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {path}");
            CoreConfig::load_from_file(&path)?
        }
        None => CoreConfig::default(),
    };
    config.validate();
    Ok(config)
}

fn spawn_swarm(world: &mut World, bounds: Rect) {
    let mut rng = thread_rng();
    for i in 0..NUM_SHIPS {
        let ship = world.create_entity(Some(&format!("ship_{i}")));
        let position = Vec2::new(
            rng.gen_range(bounds.min.x..bounds.max.x),
            rng.gen_range(bounds.min.y..bounds.max.y),
        );
        let velocity = Vec2::new(
            rng.gen_range(-MAX_SHIP_SPEED..MAX_SHIP_SPEED),
            rng.gen_range(-MAX_SHIP_SPEED..MAX_SHIP_SPEED),
        );
        world.components_mut().add(ship, Position(position));
        world.components_mut().add(ship, Velocity(velocity));
    }
}

fn describe_spatial(world: &World) {
    let Some(spatial) = world.spatial() else {
        return;
    };
    if let Some(tree) = spatial.as_any().downcast_ref::<QuadTree>() {
        let stats = tree.stats();
        log::info!(
            "Quad-tree: {} nodes, depth {}, {} subdivisions, {} merges",
            stats.node_count,
            stats.max_depth_reached,
            stats.subdivisions,
            stats.merges
        );
    } else if let Some(grid) = spatial.as_any().downcast_ref::<SpatialGrid>() {
        let (cols, rows) = grid.cell_dimensions();
        log::info!("Grid: {cols}x{rows} cells, {} occupied", grid.occupied_cells().len());
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level(LevelFilter::Info);

    println!("=== Swarm Demo ===");
    println!("  {NUM_SHIPS} ships, {NUM_FRAMES} frames, paused for {PAUSED_FRAMES} frames at frame {PAUSE_AT_FRAME}");
    println!();

    let config = load_config()?;
    let bounds = config.world.world_bounds;
    let mut world = World::with_config(&config);
    spawn_swarm(&mut world, bounds);

    let encounters = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&encounters);
    world.events().subscribe(
        EventType::Custom(CLOSE_ENCOUNTER),
        Arc::new(FnListener::new(move |_: &Event| {
            counter.fetch_add(1, Ordering::Relaxed);
        })),
    );

    world.add_system(Box::new(MovementSystem { bounds }), 0);
    world.add_system(Box::new(SpatialSyncSystem), 10);
    world.add_system(Box::<ProximitySystem>::default(), 20);

    let mut clock = FrameClock::new();
    let mut wall_time = Stopwatch::new();
    wall_time.start();

    let mut paused_frames = 0;
    while world.frame_count() < NUM_FRAMES {
        let delta_time = clock.tick();

        if world.frame_count() == PAUSE_AT_FRAME && paused_frames == 0 && !world.is_paused() {
            world.pause();
            world.events().publish(Event::new(EventType::GamePaused).with_priority(EventPriority::High));
        }
        if world.is_paused() {
            paused_frames += 1;
            if paused_frames >= PAUSED_FRAMES {
                world.resume();
                world.events().publish(Event::new(EventType::GameResumed).with_priority(EventPriority::High));
            }
        }

        world.update(delta_time);
        std::thread::sleep(TARGET_FRAME_TIME);
    }
    wall_time.stop();

    let stats = world.events().stats();
    log::info!(
        "Ran {} frames ({:.2}s simulated, {:.2}s wall) in scene '{}'",
        world.frame_count(),
        world.elapsed_time(),
        wall_time.elapsed().as_secs_f64(),
        world.scene_name()
    );
    log::info!(
        "Close encounters: {}, events published: {}, dispatched: {}, listener faults: {}",
        encounters.load(Ordering::Relaxed),
        stats.published,
        stats.dispatched,
        stats.listener_faults
    );
    describe_spatial(&world);

    world.shutdown_systems();
    Ok(())
}
