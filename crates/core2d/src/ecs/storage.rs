//! Component Storage
//!
//! One lazily-created table per component type, keyed by `TypeId`. Tables are
//! unordered hash maps, so iteration order is unspecified. Multi-type queries
//! sort each table's entity list and merge, returning sorted results.

use crate::ecs::{Component, Entity};
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Type-erased view of a single component table
trait ErasedStorage: Send + Sync {
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Table holding every component of one type
pub(crate) struct ComponentStorage<T: Component> {
    components: HashMap<Entity, T>,
}

impl<T: Component> ComponentStorage<T> {
    fn new() -> Self {
        Self {
            components: HashMap::new(),
        }
    }

    /// Entities with a component in this table, sorted ascending
    fn sorted_entities(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self.components.keys().copied().collect();
        entities.sort_unstable();
        entities
    }
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.components.remove(&entity).is_some()
    }

    fn len(&self) -> usize {
        self.components.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns every component table
#[derive(Default)]
pub struct ComponentStore {
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
}

impl ComponentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any().downcast_ref::<ComponentStorage<T>>())
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any_mut().downcast_mut::<ComponentStorage<T>>())
    }

    /// Add a component, overwriting any previous value of the same type.
    ///
    /// The table for `T` is created on first use.
    pub fn add<T: Component>(&mut self, entity: Entity, component: T) {
        if let Some(storage) = self.storage_mut::<T>() {
            storage.components.insert(entity, component);
            return;
        }

        let mut storage = ComponentStorage::<T>::new();
        storage.components.insert(entity, component);
        self.storages.insert(TypeId::of::<T>(), Box::new(storage));
    }

    /// Get a component
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.components.get(&entity)
    }

    /// Get a mutable component
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>()?.components.get_mut(&entity)
    }

    /// Check whether the entity has a component of type `T`
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.storage::<T>().is_some_and(|s| s.components.contains_key(&entity))
    }

    /// Remove a component, returning it if it was present
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.storage_mut::<T>()?.components.remove(&entity)
    }

    /// Visit every `(entity, component)` pair. Order is unspecified.
    pub fn for_each<T: Component>(&self, mut f: impl FnMut(Entity, &T)) {
        if let Some(storage) = self.storage::<T>() {
            for (&entity, component) in &storage.components {
                f(entity, component);
            }
        }
    }

    /// Visit every `(entity, component)` pair mutably. Order is unspecified.
    pub fn for_each_mut<T: Component>(&mut self, mut f: impl FnMut(Entity, &mut T)) {
        if let Some(storage) = self.storage_mut::<T>() {
            for (&entity, component) in &mut storage.components {
                f(entity, component);
            }
        }
    }

    /// Iterate over every `(entity, component)` pair. Order is unspecified.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.storage::<T>()
            .into_iter()
            .flat_map(|storage| storage.components.iter().map(|(&e, c)| (e, c)))
    }

    /// Number of components of type `T`
    pub fn count<T: Component>(&self) -> usize {
        self.storage::<T>().map_or(0, |s| s.components.len())
    }

    /// Entities that have a `T`, sorted ascending
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        self.storage::<T>().map(ComponentStorage::sorted_entities).unwrap_or_default()
    }

    /// Entities that have both a `T` and a `U`, sorted ascending
    pub fn entities_with2<T: Component, U: Component>(&self) -> Vec<Entity> {
        let (Some(a), Some(b)) = (self.storage::<T>(), self.storage::<U>()) else {
            return Vec::new();
        };
        intersect_sorted(&a.sorted_entities(), &b.sorted_entities())
    }

    /// Entities that have a `T`, a `U` and a `V`, sorted ascending
    pub fn entities_with3<T: Component, U: Component, V: Component>(&self) -> Vec<Entity> {
        let (Some(a), Some(b), Some(c)) = (self.storage::<T>(), self.storage::<U>(), self.storage::<V>()) else {
            return Vec::new();
        };
        let ab = intersect_sorted(&a.sorted_entities(), &b.sorted_entities());
        if ab.is_empty() {
            return ab;
        }
        intersect_sorted(&ab, &c.sorted_entities())
    }

    /// Remove every component belonging to `entity`. Returns how many were removed.
    pub fn remove_entity(&mut self, entity: Entity) -> usize {
        self.storages
            .values_mut()
            .map(|storage| storage.remove_entity(entity))
            .filter(|&removed| removed)
            .count()
    }

    /// Number of component types that have a table
    pub fn table_count(&self) -> usize {
        self.storages.len()
    }

    /// Total number of stored components across all tables
    pub fn total_components(&self) -> usize {
        self.storages.values().map(|s| s.len()).sum()
    }

    /// Drop every table
    pub fn clear(&mut self) {
        self.storages.clear();
    }
}

/// Merge two ascending entity lists into their intersection
fn intersect_sorted(a: &[Entity], b: &[Entity]) -> Vec<Entity> {
    let mut result = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                result.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    result
}
