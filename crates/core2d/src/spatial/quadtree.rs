//! Quad-tree spatial partitioning structure
//!
//! Recursively divides 2D space into four quadrants. Each entity box is held
//! by the deepest node whose bounds fully contain it, so a box straddling a
//! midline stays with the ancestor instead of being duplicated into children.
//! Leaves subdivide once they hold more than `max_entities_per_node` entries
//! and collapse back when removals bring a subtree under the threshold.

use super::spatial_query::{filter_by_radius, sanitize_count, SpatialIndex};
use crate::ecs::Entity;
use crate::foundation::math::Rect;
use std::any::Any;
use std::collections::HashMap;

/// Configuration for quad-tree behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadTreeConfig {
    /// Maximum subdivision depth (root is depth 0)
    pub max_depth: usize,

    /// Entries a leaf may hold before it subdivides
    pub max_entities_per_node: usize,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: super::DEFAULT_MAX_DEPTH,
            max_entities_per_node: super::DEFAULT_MAX_ENTITIES_PER_NODE,
        }
    }
}

impl QuadTreeConfig {
    fn sanitized(self) -> Self {
        Self {
            max_depth: sanitize_count(self.max_depth, super::DEFAULT_MAX_DEPTH, "max depth"),
            max_entities_per_node: sanitize_count(
                self.max_entities_per_node,
                super::DEFAULT_MAX_ENTITIES_PER_NODE,
                "max entities per node",
            ),
        }
    }
}

/// Structural counters, useful for tuning and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadTreeStats {
    /// Total subdivisions since creation (or the last rebuild)
    pub subdivisions: usize,
    /// Total merges since creation (or the last rebuild)
    pub merges: usize,
    /// Nodes currently in the tree, root included
    pub node_count: usize,
    /// Depth of the deepest existing node
    pub max_depth_reached: usize,
}

/// Snapshot of one node for debug drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadTreeNodeInfo {
    /// Node bounds
    pub bounds: Rect,
    /// Depth in the tree (0 = root)
    pub depth: usize,
    /// Entries held directly by this node
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
struct QuadTreeNode {
    bounds: Rect,
    depth: usize,
    entries: Vec<(Entity, Rect)>,
    /// Children ordered top-left, top-right, bottom-left, bottom-right
    children: Option<Box<[QuadTreeNode; 4]>>,
}

impl QuadTreeNode {
    fn new(bounds: Rect, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            entries: Vec::new(),
            children: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Index of the first child whose bounds fully contain `rect`
    fn child_index_for(&self, rect: &Rect) -> Option<usize> {
        self.children
            .as_ref()?
            .iter()
            .position(|child| child.bounds.contains_rect(rect))
    }

    fn insert(&mut self, entity: Entity, rect: Rect, config: &QuadTreeConfig, counters: &mut Counters) {
        if let Some(index) = self.child_index_for(&rect) {
            if let Some(children) = self.children.as_mut() {
                children[index].insert(entity, rect, config, counters);
                return;
            }
        }

        self.entries.push((entity, rect));

        if self.is_leaf() && self.entries.len() > config.max_entities_per_node && self.depth < config.max_depth {
            self.subdivide();
            counters.subdivisions += 1;
        }
    }

    /// Split into four children and push every entry that fits into one
    fn subdivide(&mut self) {
        let [tl, tr, bl, br] = self.bounds.quadrants();
        let depth = self.depth + 1;
        self.children = Some(Box::new([
            QuadTreeNode::new(tl, depth),
            QuadTreeNode::new(tr, depth),
            QuadTreeNode::new(bl, depth),
            QuadTreeNode::new(br, depth),
        ]));

        let entries = std::mem::take(&mut self.entries);
        for (entity, rect) in entries {
            match (self.child_index_for(&rect), self.children.as_mut()) {
                (Some(index), Some(children)) => children[index].entries.push((entity, rect)),
                _ => self.entries.push((entity, rect)),
            }
        }
    }

    /// Remove `entity`, following the path its rect would take, then try to merge on the way back up
    fn remove(&mut self, entity: Entity, rect: &Rect, config: &QuadTreeConfig, counters: &mut Counters) -> bool {
        if let Some(position) = self.entries.iter().position(|(e, _)| *e == entity) {
            self.entries.swap_remove(position);
            self.try_merge(config, counters);
            return true;
        }

        let Some(index) = self.child_index_for(rect) else {
            return false;
        };
        let removed = match self.children.as_mut() {
            Some(children) => children[index].remove(entity, rect, config, counters),
            None => false,
        };
        if removed {
            self.try_merge(config, counters);
        }
        removed
    }

    fn try_merge(&mut self, config: &QuadTreeConfig, counters: &mut Counters) {
        let Some(children) = self.children.as_ref() else {
            return;
        };
        if !children.iter().all(QuadTreeNode::is_leaf) {
            return;
        }
        let combined = self.entries.len() + children.iter().map(|c| c.entries.len()).sum::<usize>();
        if combined > config.max_entities_per_node {
            return;
        }

        if let Some(children) = self.children.take() {
            let children: [QuadTreeNode; 4] = *children;
            for child in children {
                self.entries.extend(child.entries);
            }
            counters.merges += 1;
        }
    }

    fn query(&self, area: &Rect, results: &mut Vec<Entity>) {
        if !self.bounds.intersects(area) {
            return;
        }

        results.extend(
            self.entries
                .iter()
                .filter(|(_, rect)| rect.intersects(area))
                .map(|(entity, _)| *entity),
        );

        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.query(area, results);
            }
        }
    }

    fn visit<'a>(&'a self, visitor: &mut impl FnMut(&'a QuadTreeNode)) {
        visitor(self);
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.visit(visitor);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    subdivisions: usize,
    merges: usize,
}

/// Quad-tree spatial index
#[derive(Debug, Clone)]
pub struct QuadTree {
    root: QuadTreeNode,
    config: QuadTreeConfig,
    /// Current box of every indexed entity
    locations: HashMap<Entity, Rect>,
    counters: Counters,
    debug: bool,
}

impl QuadTree {
    /// Create an empty tree covering `world_bounds`. Invalid limits fall back to defaults.
    pub fn new(world_bounds: Rect, config: QuadTreeConfig) -> Self {
        Self {
            root: QuadTreeNode::new(world_bounds, 0),
            config: config.sanitized(),
            locations: HashMap::new(),
            counters: Counters::default(),
            debug: false,
        }
    }

    /// Active limits
    pub fn config(&self) -> QuadTreeConfig {
        self.config
    }

    /// Change the depth limit and rebuild the tree
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.config.max_depth = sanitize_count(max_depth, super::DEFAULT_MAX_DEPTH, "max depth");
        self.rebuild();
    }

    /// Change the split threshold and rebuild the tree
    pub fn set_max_entities_per_node(&mut self, max_entities: usize) {
        self.config.max_entities_per_node =
            sanitize_count(max_entities, super::DEFAULT_MAX_ENTITIES_PER_NODE, "max entities per node");
        self.rebuild();
    }

    /// Structural counters and shape of the current tree
    pub fn stats(&self) -> QuadTreeStats {
        let mut stats = QuadTreeStats {
            subdivisions: self.counters.subdivisions,
            merges: self.counters.merges,
            ..QuadTreeStats::default()
        };
        self.root.visit(&mut |node| {
            stats.node_count += 1;
            stats.max_depth_reached = stats.max_depth_reached.max(node.depth);
        });
        stats
    }

    /// Every node in depth-first order, for visualisation
    pub fn debug_nodes(&self) -> Vec<QuadTreeNodeInfo> {
        let mut nodes = Vec::new();
        self.root.visit(&mut |node| {
            nodes.push(QuadTreeNodeInfo {
                bounds: node.bounds,
                depth: node.depth,
                entry_count: node.entries.len(),
            });
        });
        nodes
    }

    /// Clear and reinsert every tracked entity under the current limits
    fn rebuild(&mut self) {
        let mut entries: Vec<(Entity, Rect)> = self.locations.drain().collect();
        entries.sort_by_key(|(entity, _)| *entity);

        self.root = QuadTreeNode::new(self.root.bounds, 0);
        self.counters = Counters::default();
        for (entity, rect) in entries {
            self.root.insert(entity, rect, &self.config, &mut self.counters);
            self.locations.insert(entity, rect);
        }

        log::debug!(
            "[QuadTree] Rebuilt {} entities (max depth {}, max per node {})",
            self.locations.len(),
            self.config.max_depth,
            self.config.max_entities_per_node
        );
    }
}

impl SpatialIndex for QuadTree {
    fn insert(&mut self, entity: Entity, bounds: Rect) -> bool {
        self.remove(entity);

        if !self.root.bounds.intersects(&bounds) {
            log::warn!("[QuadTree] Entity {entity} at {bounds:?} is outside the world bounds, not indexed");
            return false;
        }

        let before = self.counters.subdivisions;
        self.root.insert(entity, bounds, &self.config, &mut self.counters);
        self.locations.insert(entity, bounds);

        if self.debug && self.counters.subdivisions > before {
            log::debug!("[QuadTree] Inserting {entity} caused a subdivision");
        }
        true
    }

    fn remove(&mut self, entity: Entity) -> bool {
        let Some(rect) = self.locations.remove(&entity) else {
            return false;
        };

        let before = self.counters.merges;
        let removed = self.root.remove(entity, &rect, &self.config, &mut self.counters);
        if !removed {
            log::error!("[QuadTree] Entity {entity} was tracked but missing from its node");
        }
        if self.debug && self.counters.merges > before {
            log::debug!("[QuadTree] Removing {entity} merged {} node(s)", self.counters.merges - before);
        }
        removed
    }

    fn clear(&mut self) {
        self.root = QuadTreeNode::new(self.root.bounds, 0);
        self.locations.clear();
    }

    fn query(&self, area: &Rect) -> Vec<Entity> {
        let mut results = Vec::new();
        self.root.query(area, &mut results);
        results.sort_unstable();
        results
    }

    fn nearby(&self, entity: Entity, radius: f32) -> Vec<Entity> {
        filter_by_radius(self, entity, radius)
    }

    fn bounds_of(&self, entity: Entity) -> Option<Rect> {
        self.locations.get(&entity).copied()
    }

    fn entity_count(&self) -> usize {
        self.locations.len()
    }

    fn world_bounds(&self) -> Rect {
        self.root.bounds
    }

    fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    fn is_debug(&self) -> bool {
        self.debug
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
