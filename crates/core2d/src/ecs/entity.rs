//! Entity handles and the entity registry
//!
//! An [`Entity`] is an `(id, generation)` pair. Ids are recycled LIFO from a
//! free list; every recycle bumps the slot generation so a stale handle kept
//! by game code never validates against the entity now occupying its id.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;

/// Entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    id: u32,
    generation: u32,
}

impl Entity {
    /// The "no entity" handle. Id zero is never issued.
    pub const NULL: Self = Self { id: 0, generation: 0 };

    /// Create a handle from raw parts
    pub const fn new(id: u32, generation: u32) -> Self {
        Self { id, generation }
    }

    /// Get the entity ID
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Get the generation of this handle
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// True for [`Entity::NULL`]
    pub const fn is_null(&self) -> bool {
        self.id == 0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.id, self.generation)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u32,
    alive: bool,
}

#[derive(Debug)]
struct RegistryState {
    next_id: u32,
    /// Indexed by id; slot 0 is the reserved null id
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    names: HashMap<u32, String>,
    active: usize,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            next_id: 1,
            slots: vec![Slot::default()],
            free_list: Vec::new(),
            names: HashMap::new(),
            active: 0,
        }
    }

    fn is_valid(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.id as usize)
            .is_some_and(|slot| entity.id != 0 && slot.alive && slot.generation == entity.generation)
    }
}

/// Issues, validates and recycles entity handles.
///
/// Every operation takes the internal lock, so the registry can be shared by
/// reference across threads even though the world is ticked from one thread.
#[derive(Debug)]
pub struct EntityRegistry {
    state: Mutex<RegistryState>,
}

impl EntityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::new()),
        }
    }

    /// Allocate a handle, reusing the most recently freed id first
    pub fn create(&self, name: Option<&str>) -> Entity {
        let mut state = self.state.lock();

        let id = match state.free_list.pop() {
            Some(id) => id,
            None => {
                let id = state.next_id;
                state.next_id += 1;
                // Slots survive `clear_all`, so a restarted counter may land on an existing slot
                if state.slots.len() <= id as usize {
                    state.slots.push(Slot::default());
                }
                id
            }
        };

        let slot = &mut state.slots[id as usize];
        slot.alive = true;
        let entity = Entity::new(id, slot.generation);

        if let Some(name) = name {
            state.names.insert(id, name.to_string());
        }
        state.active += 1;

        log::trace!("[EntityRegistry] Created entity {entity}");
        entity
    }

    /// Destroy a handle. No-op for handles that are not currently active.
    pub fn destroy(&self, entity: Entity) -> bool {
        let mut state = self.state.lock();
        if !state.is_valid(entity) {
            log::debug!("[EntityRegistry] Ignoring destroy of inactive entity {entity}");
            return false;
        }

        let slot = &mut state.slots[entity.id as usize];
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        state.free_list.push(entity.id);
        state.names.remove(&entity.id);
        state.active -= 1;

        log::trace!("[EntityRegistry] Destroyed entity {entity}");
        true
    }

    /// Check whether the handle refers to a live entity
    pub fn is_valid(&self, entity: Entity) -> bool {
        self.state.lock().is_valid(entity)
    }

    /// Debug name given at creation, if any
    pub fn name(&self, entity: Entity) -> Option<String> {
        let state = self.state.lock();
        if state.is_valid(entity) {
            state.names.get(&entity.id).cloned()
        } else {
            None
        }
    }

    /// Number of live entities
    pub fn active_count(&self) -> usize {
        self.state.lock().active
    }

    /// All live entities ordered by id
    pub fn active_entities(&self) -> Vec<Entity> {
        let state = self.state.lock();
        state
            .slots
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, slot)| slot.alive)
            .filter_map(|(id, slot)| u32::try_from(id).ok().map(|id| Entity::new(id, slot.generation)))
            .collect()
    }

    /// Forget every entity. Ids restart at 1.
    ///
    /// Slot generations are kept (live slots are bumped), so handles issued
    /// before the clear stay invalid after their ids are handed out again.
    pub fn clear_all(&self) {
        let mut state = self.state.lock();
        let mut slots = std::mem::take(&mut state.slots);
        for slot in &mut slots {
            if slot.alive {
                slot.alive = false;
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        *state = RegistryState::new();
        state.slots = slots;
        log::debug!("[EntityRegistry] Cleared all entities");
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one() {
        let registry = EntityRegistry::new();
        let e = registry.create(None);
        assert_eq!(e.id(), 1);
        assert!(!e.is_null());
        assert!(registry.is_valid(e));
        assert!(!registry.is_valid(Entity::NULL));
    }

    #[test]
    fn test_lifo_recycling() {
        let registry = EntityRegistry::new();
        let first = registry.create(None);
        let second = registry.create(None);
        registry.destroy(first);
        let third = registry.create(None);

        assert_eq!(third.id(), first.id());
        assert_ne!(third.id(), second.id());
        assert_ne!(third, first);
        assert!(!registry.is_valid(first));
        assert!(registry.is_valid(third));
    }

    #[test]
    fn test_most_recently_freed_reused_first() {
        let registry = EntityRegistry::new();
        let a = registry.create(None);
        let b = registry.create(None);
        let _c = registry.create(None);
        registry.destroy(a);
        registry.destroy(b);

        assert_eq!(registry.create(None).id(), b.id());
        assert_eq!(registry.create(None).id(), a.id());
        assert_eq!(registry.create(None).id(), 4);
    }

    #[test]
    fn test_destroy_inactive_is_noop() {
        let registry = EntityRegistry::new();
        let e = registry.create(None);
        assert!(registry.destroy(e));
        assert!(!registry.destroy(e));
        assert!(!registry.destroy(Entity::new(99, 0)));
        assert_eq!(registry.active_count(), 0);

        // The stale handle must not free the recycled slot
        let reused = registry.create(None);
        assert!(!registry.destroy(e));
        assert!(registry.is_valid(reused));
    }

    #[test]
    fn test_names_and_active_listing() {
        let registry = EntityRegistry::new();
        let player = registry.create(Some("player"));
        let rock = registry.create(None);
        assert_eq!(registry.name(player).as_deref(), Some("player"));
        assert_eq!(registry.name(rock), None);

        registry.destroy(player);
        assert_eq!(registry.name(player), None);
        assert_eq!(registry.active_entities(), vec![rock]);
    }

    #[test]
    fn test_clear_all_restarts_counter() {
        let registry = EntityRegistry::new();
        for _ in 0..5 {
            registry.create(None);
        }
        registry.clear_all();
        assert_eq!(registry.active_count(), 0);
        assert!(registry.active_entities().is_empty());
        assert_eq!(registry.create(None).id(), 1);
    }

    #[test]
    fn test_handles_from_before_clear_stay_invalid() {
        let registry = EntityRegistry::new();
        let old_first = registry.create(None);
        let old_second = registry.create(None);
        registry.destroy(old_second);
        registry.clear_all();

        let new_first = registry.create(None);
        let new_second = registry.create(None);
        assert_eq!(new_first.id(), old_first.id());
        assert_eq!(new_second.id(), old_second.id());
        assert!(!registry.is_valid(old_first));
        assert!(!registry.is_valid(old_second));
        assert!(registry.is_valid(new_first));
        assert!(registry.is_valid(new_second));
        assert!(!registry.destroy(old_first));
        assert_eq!(registry.active_count(), 2);
    }

    #[test]
    fn test_registry_shared_across_threads() {
        let registry = std::sync::Arc::new(EntityRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || (0..100).map(|_| registry.create(None)).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<Entity> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 400);
        assert_eq!(registry.active_count(), 400);
    }
}
