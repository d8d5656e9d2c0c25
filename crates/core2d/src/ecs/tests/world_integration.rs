//! Integration tests driving a full World tick by tick

use crate::config::CoreConfig;
use crate::ecs::{Entity, FnSystem, System, World};
use crate::events::{Event, EventListener, EventPriority, EventType, FnListener};
use crate::foundation::math::{Rect, Vec2};
use crate::spatial::{QuadTree, SpatialConfig, SpatialGrid, SpatialIndexKind};
use parking_lot::Mutex;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

/// Appends its name to a shared log every tick and counts its own updates
struct Recorder {
    name: String,
    log: Log,
    updates: u32,
    lifecycle: Log,
}

impl Recorder {
    fn boxed(name: &str, log: &Log) -> Box<Self> {
        Self::with_lifecycle(name, log, &Log::default())
    }

    fn with_lifecycle(name: &str, log: &Log, lifecycle: &Log) -> Box<Self> {
        Box::new(Self {
            name: name.to_string(),
            log: Arc::clone(log),
            updates: 0,
            lifecycle: Arc::clone(lifecycle),
        })
    }
}

impl System for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, _world: &mut World) {
        self.lifecycle.lock().push(format!("init:{}", self.name));
    }

    fn update(&mut self, _world: &mut World, _delta_time: f32) {
        self.updates += 1;
        self.log.lock().push(format!("{}#{}", self.name, self.updates));
    }

    fn shutdown(&mut self, _world: &mut World) {
        self.lifecycle.lock().push(format!("shutdown:{}", self.name));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position(Vec2);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Health(i32);

#[test]
fn test_systems_run_in_priority_order() {
    let log = Log::default();
    let mut world = World::new();
    world.add_system(Recorder::boxed("c", &log), 30);
    world.add_system(Recorder::boxed("a", &log), 10);
    world.add_system(Recorder::boxed("b", &log), 20);
    world.add_system(Recorder::boxed("b2", &log), 20);

    world.update(0.016);
    assert_eq!(*log.lock(), ["a#1", "b#1", "b2#1", "c#1"]);
}

#[test]
fn test_paused_system_keeps_state() {
    let log = Log::default();
    let mut world = World::new();
    world.add_system(Recorder::boxed("ai", &log), 0);

    world.update(0.1);
    world.scheduler_mut().pause_system("ai");
    world.update(0.1);
    world.update(0.1);
    world.scheduler_mut().resume_system("ai");
    world.update(0.1);

    assert_eq!(*log.lock(), ["ai#1", "ai#2"]);
    assert_eq!(world.frame_count(), 4);
}

#[test]
fn test_paused_world_skips_everything() {
    let log = Log::default();
    let delivered = Arc::new(Mutex::new(0));
    let mut world = World::new();
    world.add_system(Recorder::boxed("physics", &log), 0);

    let counter = Arc::clone(&delivered);
    world
        .events()
        .subscribe(EventType::GamePaused, Arc::new(FnListener::new(move |_: &Event| *counter.lock() += 1)));

    world.pause();
    world.events().publish(Event::new(EventType::GamePaused));
    world.update(1.0);
    world.update(1.0);

    assert!(log.lock().is_empty());
    assert_eq!(*delivered.lock(), 0);
    assert_eq!(world.frame_count(), 0);
    assert_eq!(world.elapsed_time(), 0.0);
    assert_eq!(world.events().pending_count(), 1);

    world.resume();
    world.update(0.5);
    assert_eq!(*log.lock(), ["physics#1"]);
    assert_eq!(*delivered.lock(), 1);
    assert_eq!(world.frame_count(), 1);
    assert!((world.elapsed_time() - 0.5).abs() < 1e-9);
}

#[test]
fn test_events_drain_by_priority_before_systems() {
    let order = Log::default();
    let mut world = World::new();

    let seen = Arc::clone(&order);
    let listener: Arc<dyn EventListener> = Arc::new(FnListener::new(move |event: &Event| {
        seen.lock().push(format!("{:?}", event.priority()));
    }));
    world.events().subscribe(EventType::DamageTaken, Arc::clone(&listener));

    let system_log = Arc::clone(&order);
    world.add_system(
        Box::new(FnSystem::new("combat", move |_world: &mut World, _dt: f32| {
            system_log.lock().push("combat".to_string());
        })),
        0,
    );

    for priority in [EventPriority::Low, EventPriority::Critical, EventPriority::Medium] {
        world.events().publish_with_priority(Event::new(EventType::DamageTaken), priority);
    }
    world.update(0.016);

    assert_eq!(*order.lock(), ["Critical", "Medium", "Low", "combat"]);
}

#[test]
fn test_events_published_by_systems_arrive_next_tick() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let mut world = World::new();

    let sink = Arc::clone(&received);
    world.events().subscribe(
        EventType::Custom(7),
        Arc::new(FnListener::new(move |event: &Event| {
            if let Some(frame) = event.payload::<u64>() {
                sink.lock().push(*frame);
            }
        })),
    );
    world.add_system(
        Box::new(FnSystem::new("emitter", |world: &mut World, _dt: f32| {
            let frame = world.frame_count();
            world.events().publish(Event::custom(7).with_payload(frame));
        })),
        0,
    );

    world.update(0.016);
    assert!(received.lock().is_empty());
    world.update(0.016);
    world.update(0.016);
    assert_eq!(*received.lock(), [0, 1]);
}

#[test]
fn test_destroy_entity_purges_everything() {
    let mut config = CoreConfig::default();
    config.world.world_bounds = Rect::from_xywh(0.0, 0.0, 200.0, 200.0);
    config.world.spatial = Some(SpatialConfig {
        kind: SpatialIndexKind::Grid,
        ..SpatialConfig::default()
    });
    let mut world = World::with_config(&config);

    let ship = world.create_entity(Some("ship"));
    let rock = world.create_entity(None);
    world.components_mut().add(ship, Position(Vec2::new(10.0, 10.0)));
    world.components_mut().add(ship, Health(3));
    world.components_mut().add(rock, Health(9));
    if let Some(spatial) = world.spatial_mut() {
        spatial.insert(ship, Rect::from_xywh(5.0, 5.0, 10.0, 10.0));
    }

    let destroyed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&destroyed);
    world.events().subscribe(
        EventType::EntityDestroyed,
        Arc::new(FnListener::new(move |event: &Event| {
            if let Some(entity) = event.payload::<Entity>() {
                sink.lock().push(*entity);
            }
        })),
    );

    assert!(world.destroy_entity(ship));
    assert!(!world.destroy_entity(ship));
    world.update(0.016);

    assert!(!world.entities().is_valid(ship));
    assert!(!world.components().has::<Position>(ship));
    assert!(!world.components().has::<Health>(ship));
    assert_eq!(world.components().get::<Health>(rock), Some(&Health(9)));
    assert_eq!(world.spatial().map(|s| s.entity_count()), Some(0));
    assert_eq!(*destroyed.lock(), [ship]);
}

#[test]
fn test_recycled_handle_does_not_alias_destroyed_entity() {
    let mut world = World::new();
    let first = world.create_entity(None);
    world.components_mut().add(first, Health(1));
    world.destroy_entity(first);

    let second = world.create_entity(None);
    assert_eq!(second.id(), first.id());
    assert_ne!(second, first);
    assert!(!world.components().has::<Health>(second));
    assert!(!world.entities().is_valid(first));
}

#[test]
fn test_lifecycle_hooks() {
    let log = Log::default();
    let lifecycle = Log::default();
    {
        let mut world = World::new();
        world.add_system(Recorder::with_lifecycle("input", &log, &lifecycle), 0);
        world.add_system(Recorder::with_lifecycle("audio", &log, &lifecycle), 5);
        assert!(!world.add_system(Recorder::with_lifecycle("audio", &log, &lifecycle), 1));

        assert!(world.remove_system("input"));
        assert!(!world.remove_system("input"));
        world.update(0.016);
    }

    assert_eq!(
        *lifecycle.lock(),
        ["init:input", "init:audio", "shutdown:input", "shutdown:audio"]
    );
    assert_eq!(*log.lock(), ["audio#1"]);
}

#[test]
fn test_systems_can_change_the_schedule_mid_tick() {
    let log = Log::default();
    let mut world = World::new();

    let spawned_log = Arc::clone(&log);
    world.add_system(
        Box::new(FnSystem::new("director", move |world: &mut World, _dt: f32| {
            if world.frame_count() == 0 {
                world.remove_system("late");
                world.scheduler_mut().pause_system("middle");
                world.add_system(Recorder::boxed("spawned", &spawned_log), -10);
            }
        })),
        0,
    );
    world.add_system(Recorder::boxed("middle", &log), 5);
    world.add_system(Recorder::boxed("late", &log), 10);

    world.update(0.016);
    assert!(log.lock().is_empty());

    world.update(0.016);
    assert_eq!(*log.lock(), ["spawned#1"]);
    assert_eq!(world.scheduler_mut().execution_order(), ["spawned", "director", "middle"]);
}

#[test]
fn test_system_can_remove_itself() {
    let mut world = World::new();
    world.add_system(
        Box::new(FnSystem::new("once", |world: &mut World, _dt: f32| {
            world.remove_system("once");
        })),
        0,
    );

    world.update(0.016);
    assert!(!world.scheduler().has_system("once"));
    assert_eq!(world.scheduler().system_count(), 0);
}

#[test]
fn test_spatial_sync_through_components() {
    let mut config = CoreConfig::default();
    config.world.world_bounds = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
    config.world.spatial = Some(SpatialConfig {
        kind: SpatialIndexKind::QuadTree,
        max_entities_per_node: 2,
        ..SpatialConfig::default()
    });
    let mut world = World::with_config(&config);
    assert!(world.spatial().is_some_and(|s| s.as_any().is::<QuadTree>()));

    let entities: Vec<Entity> = (0..6).map(|_| world.create_entity(None)).collect();
    for (i, &entity) in entities.iter().enumerate() {
        world
            .components_mut()
            .add(entity, Position(Vec2::new(10.0 + i as f32 * 15.0, 50.0)));
    }

    world.add_system(
        Box::new(FnSystem::new("spatial_sync", |world: &mut World, _dt: f32| {
            let (components, spatial) = world.components_and_spatial_mut();
            let Some(spatial) = spatial else {
                return;
            };
            components.for_each::<Position>(|entity, position| {
                spatial.update(entity, Rect::around(position.0, 1.0));
            });
        })),
        0,
    );
    world.update(0.016);

    let spatial = world.spatial().map(|s| s.nearby(entities[2], 16.0));
    assert_eq!(spatial, Some(vec![entities[1], entities[3]]));
}

#[test]
fn test_clear_keeps_systems() {
    let mut config = CoreConfig::default();
    config.world.scene_name = "arena".to_string();
    let mut world = World::with_config(&config);
    assert_eq!(world.scene_name(), "arena");

    let log = Log::default();
    world.add_system(Recorder::boxed("ticker", &log), 0);
    let entity = world.create_entity(Some("crate"));
    world.components_mut().add(entity, Health(5));

    world.clear();
    assert_eq!(world.entities().active_count(), 0);
    assert_eq!(world.components().table_count(), 0);
    assert_eq!(world.events().pending_count(), 0);
    assert!(world.scheduler().has_system("ticker"));

    world.set_scene_name("menu");
    assert_eq!(world.scene_name(), "menu");
    assert!(world.spatial().is_some_and(|s| !s.as_any().is::<SpatialGrid>()));
}
