//! Abstract spatial query interface
//!
//! Both the quad-tree and the uniform grid implement [`SpatialIndex`], so
//! callers can swap one for the other without code changes.

use super::{QuadTree, QuadTreeConfig, SpatialGrid};
use crate::ecs::Entity;
use crate::foundation::math::Rect;
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Default grid cell size in world units
pub const DEFAULT_CELL_SIZE: f32 = 64.0;

/// Default quad-tree depth limit
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Default quad-tree split threshold
pub const DEFAULT_MAX_ENTITIES_PER_NODE: usize = 8;

/// Abstract interface for spatial partitioning
pub trait SpatialIndex: Send + Sync {
    /// Insert (or re-insert) an entity with its bounding box.
    ///
    /// Returns false when the box lies entirely outside the world bounds; the
    /// entity is then not indexed.
    fn insert(&mut self, entity: Entity, bounds: Rect) -> bool;

    /// Move an entity to a new bounding box
    fn update(&mut self, entity: Entity, bounds: Rect) -> bool {
        self.insert(entity, bounds)
    }

    /// Remove an entity. Returns false if it was not indexed.
    fn remove(&mut self, entity: Entity) -> bool;

    /// Remove every entity
    fn clear(&mut self);

    /// Entities whose box intersects `area`, sorted ascending
    fn query(&self, area: &Rect) -> Vec<Entity>;

    /// Entities whose box center lies within `radius` of `entity`'s box center,
    /// excluding `entity` itself. Empty if `entity` is not indexed.
    fn nearby(&self, entity: Entity, radius: f32) -> Vec<Entity>;

    /// Bounding box currently stored for `entity`
    fn bounds_of(&self, entity: Entity) -> Option<Rect>;

    /// Number of indexed entities
    fn entity_count(&self) -> usize;

    /// Bounds the index covers
    fn world_bounds(&self) -> Rect;

    /// Toggle verbose debug logging
    fn set_debug(&mut self, enabled: bool);

    /// Whether debug logging is on
    fn is_debug(&self) -> bool;

    /// Downcast to Any for type-specific access
    fn as_any(&self) -> &dyn Any;

    /// Downcast to Any for mutable type-specific access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Which spatial structure to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpatialIndexKind {
    /// Uniform grid
    Grid,
    /// Recursive quad-tree
    #[default]
    QuadTree,
    /// Picks a structure automatically; currently always the quad-tree
    Adaptive,
}

/// Spatial index parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Structure to build
    pub kind: SpatialIndexKind,
    /// Grid cell size in world units
    pub cell_size: f32,
    /// Quad-tree depth limit
    pub max_depth: usize,
    /// Quad-tree split threshold
    pub max_entities_per_node: usize,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            kind: SpatialIndexKind::default(),
            cell_size: DEFAULT_CELL_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            max_entities_per_node: DEFAULT_MAX_ENTITIES_PER_NODE,
        }
    }
}

impl SpatialConfig {
    /// Clamp invalid parameters to their defaults, logging each correction
    pub fn validate(&mut self) {
        self.cell_size = sanitize_cell_size(self.cell_size);
        self.max_depth = sanitize_count(self.max_depth, DEFAULT_MAX_DEPTH, "max depth");
        self.max_entities_per_node =
            sanitize_count(self.max_entities_per_node, DEFAULT_MAX_ENTITIES_PER_NODE, "max entities per node");
    }
}

pub(crate) fn sanitize_cell_size(cell_size: f32) -> f32 {
    if cell_size > 0.0 && cell_size.is_finite() {
        cell_size
    } else {
        log::warn!("[Spatial] Invalid cell size {cell_size}, using {DEFAULT_CELL_SIZE}");
        DEFAULT_CELL_SIZE
    }
}

pub(crate) fn sanitize_count(value: usize, default: usize, what: &str) -> usize {
    if value > 0 {
        value
    } else {
        log::warn!("[Spatial] Invalid {what} {value}, using {default}");
        default
    }
}

/// Build a spatial index of the requested kind covering `world_bounds`
pub fn create_spatial_index(kind: SpatialIndexKind, world_bounds: Rect, config: &SpatialConfig) -> Box<dyn SpatialIndex> {
    match kind {
        SpatialIndexKind::Grid => Box::new(SpatialGrid::new(world_bounds, config.cell_size)),
        SpatialIndexKind::QuadTree | SpatialIndexKind::Adaptive => {
            if kind == SpatialIndexKind::Adaptive {
                log::debug!("[Spatial] Adaptive index requested, using quad-tree");
            }
            Box::new(QuadTree::new(
                world_bounds,
                QuadTreeConfig {
                    max_depth: config.max_depth,
                    max_entities_per_node: config.max_entities_per_node,
                },
            ))
        }
    }
}

/// Shared radius filter: center-to-center distance against the candidates of a square pre-query.
/// A negative or non-finite radius matches nothing.
pub(crate) fn filter_by_radius(
    index: &dyn SpatialIndex,
    entity: Entity,
    radius: f32,
) -> Vec<Entity> {
    if radius < 0.0 || !radius.is_finite() {
        return Vec::new();
    }
    let Some(bounds) = index.bounds_of(entity) else {
        return Vec::new();
    };
    let center = bounds.center();
    let radius_sq = radius * radius;

    index
        .query(&Rect::around(center, radius))
        .into_iter()
        .filter(|&other| other != entity)
        .filter(|&other| {
            index
                .bounds_of(other)
                .is_some_and(|b| (b.center() - center).magnitude_squared() <= radius_sq)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;

    fn e(id: u32) -> Entity {
        Entity::new(id, 0)
    }

    fn both_kinds() -> Vec<Box<dyn SpatialIndex>> {
        let bounds = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
        let config = SpatialConfig {
            cell_size: 10.0,
            max_entities_per_node: 2,
            ..SpatialConfig::default()
        };
        vec![
            create_spatial_index(SpatialIndexKind::Grid, bounds, &config),
            create_spatial_index(SpatialIndexKind::QuadTree, bounds, &config),
            create_spatial_index(SpatialIndexKind::Adaptive, bounds, &config),
        ]
    }

    #[test]
    fn test_factory_kinds() {
        let indices = both_kinds();
        assert!(indices[0].as_any().downcast_ref::<SpatialGrid>().is_some());
        assert!(indices[1].as_any().downcast_ref::<QuadTree>().is_some());
        assert!(indices[2].as_any().downcast_ref::<QuadTree>().is_some());
    }

    #[test]
    fn test_invalid_radius_matches_nothing() {
        for mut index in both_kinds() {
            index.insert(e(1), Rect::from_xywh(40.0, 40.0, 2.0, 2.0));
            index.insert(e(2), Rect::from_xywh(41.0, 41.0, 2.0, 2.0));
            assert_eq!(index.nearby(e(1), 5.0), vec![e(2)]);

            for radius in [-5.0, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
                assert!(index.nearby(e(1), radius).is_empty(), "radius {radius}");
            }
        }
    }

    #[test]
    fn test_implementations_agree() {
        for mut index in both_kinds() {
            for id in 1..=20u32 {
                let x = (id * 7 % 90) as f32;
                let y = (id * 13 % 90) as f32;
                assert!(index.insert(e(id), Rect::from_xywh(x, y, 4.0, 4.0)));
            }
            index.update(e(3), Rect::from_xywh(50.0, 50.0, 2.0, 2.0));
            index.remove(e(4));

            let area = Rect::from_xywh(20.0, 20.0, 40.0, 40.0);
            let mut expected: Vec<Entity> = (1..=20u32)
                .map(e)
                .filter(|&ent| index.bounds_of(ent).is_some_and(|b| b.intersects(&area)))
                .collect();
            expected.sort();

            assert_eq!(index.query(&area), expected);
            assert_eq!(index.entity_count(), 19);
        }
    }

    #[test]
    fn test_nearby_excludes_self_and_far_entities() {
        for mut index in both_kinds() {
            index.insert(e(1), Rect::from_center_half_extents(Vec2::new(50.0, 50.0), Vec2::new(1.0, 1.0)));
            index.insert(e(2), Rect::from_center_half_extents(Vec2::new(53.0, 54.0), Vec2::new(1.0, 1.0)));
            // Inside the square pre-query but outside the circle
            index.insert(e(3), Rect::from_center_half_extents(Vec2::new(54.5, 54.5), Vec2::new(1.0, 1.0)));
            index.insert(e(4), Rect::from_center_half_extents(Vec2::new(90.0, 90.0), Vec2::new(1.0, 1.0)));

            assert_eq!(index.nearby(e(1), 5.0), vec![e(2)]);
            assert!(index.nearby(e(99), 5.0).is_empty());
        }
    }

    #[test]
    fn test_outside_bounds_rejected() {
        for mut index in both_kinds() {
            assert!(!index.insert(e(1), Rect::from_xywh(200.0, 200.0, 5.0, 5.0)));
            assert_eq!(index.entity_count(), 0);
            assert!(index.bounds_of(e(1)).is_none());
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = SpatialConfig {
            kind: SpatialIndexKind::Grid,
            cell_size: f32::NAN,
            max_depth: 0,
            max_entities_per_node: 0,
        };
        config.validate();
        assert_eq!(config, SpatialConfig { kind: SpatialIndexKind::Grid, ..SpatialConfig::default() });
    }
}
