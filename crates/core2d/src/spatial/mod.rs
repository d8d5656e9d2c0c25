//! Spatial partitioning data structures
//!
//! Provides rectangle and proximity queries over entity bounding boxes in 2D
//! world space. The quad-tree adapts to clustered scenes; the uniform grid is
//! cheaper when entities are spread evenly.

mod grid;
mod quadtree;
mod spatial_query;

pub use grid::SpatialGrid;
pub use quadtree::{QuadTree, QuadTreeConfig, QuadTreeNodeInfo, QuadTreeStats};
pub use spatial_query::{
    create_spatial_index, SpatialConfig, SpatialIndex, SpatialIndexKind, DEFAULT_CELL_SIZE, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_ENTITIES_PER_NODE,
};
