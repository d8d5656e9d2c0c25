//! Uniform grid spatial index
//!
//! The world is cut into fixed-size square cells. A box is registered in every
//! cell it overlaps, so cell membership is only a broad phase; queries merge
//! candidates into a set and test the real boxes afterwards.

use super::spatial_query::{filter_by_radius, sanitize_cell_size, SpatialIndex};
use crate::ecs::Entity;
use crate::foundation::math::{Rect, Vec2};
use std::any::Any;
use std::collections::{BTreeSet, HashMap};

/// Upper bound on the number of cells a grid allocates
const MAX_GRID_CELLS: usize = 1 << 20;

/// Inclusive cell range covered by a box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    min_col: usize,
    max_col: usize,
    min_row: usize,
    max_row: usize,
}

impl CellRange {
    fn cells(self) -> impl Iterator<Item = (usize, usize)> {
        (self.min_row..=self.max_row).flat_map(move |row| (self.min_col..=self.max_col).map(move |col| (col, row)))
    }
}

/// Uniform grid spatial index
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    bounds: Rect,
    cell_size: f32,
    cols: usize,
    rows: usize,
    /// Row-major; each cell lists the entities overlapping it
    cells: Vec<Vec<Entity>>,
    locations: HashMap<Entity, Rect>,
    debug: bool,
}

impl SpatialGrid {
    /// Create an empty grid covering `world_bounds`. An invalid cell size falls back to the default.
    pub fn new(world_bounds: Rect, cell_size: f32) -> Self {
        let cell_size = Self::fit_cell_size(&world_bounds, sanitize_cell_size(cell_size));
        let (cols, rows) = Self::dimensions_for(&world_bounds, cell_size);
        log::debug!("[SpatialGrid] Created {cols}x{rows} grid with cell size {cell_size}");

        Self {
            bounds: world_bounds,
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
            locations: HashMap::new(),
            debug: false,
        }
    }

    fn dimensions_for(bounds: &Rect, cell_size: f32) -> (usize, usize) {
        let cols = (bounds.width() / cell_size).ceil().max(1.0) as usize;
        let rows = (bounds.height() / cell_size).ceil().max(1.0) as usize;
        (cols, rows)
    }

    /// Grow `cell_size` until the grid fits in `MAX_GRID_CELLS`
    fn fit_cell_size(bounds: &Rect, cell_size: f32) -> f32 {
        let mut fitted = cell_size;
        let mut doublings = 0;
        loop {
            let (cols, rows) = Self::dimensions_for(bounds, fitted);
            if cols.saturating_mul(rows) <= MAX_GRID_CELLS || !fitted.is_finite() {
                break;
            }
            fitted *= 2.0;
            doublings += 1;
        }
        if doublings > 0 {
            log::warn!(
                "[SpatialGrid] Cell size {cell_size} needs more than {MAX_GRID_CELLS} cells, using {fitted} instead"
            );
        }
        fitted
    }

    /// Edge length of one cell
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid size as (columns, rows)
    pub fn cell_dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Cells holding at least one entity, as (column, row, entity count)
    pub fn occupied_cells(&self) -> Vec<(usize, usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(index, cell)| (index % self.cols, index / self.cols, cell.len()))
            .collect()
    }

    /// Change the cell size and rebuild every cell
    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = Self::fit_cell_size(&self.bounds, sanitize_cell_size(cell_size));
        let (cols, rows) = Self::dimensions_for(&self.bounds, self.cell_size);
        self.cols = cols;
        self.rows = rows;
        self.cells = vec![Vec::new(); cols * rows];

        let locations: Vec<(Entity, Rect)> = self.locations.iter().map(|(e, r)| (*e, *r)).collect();
        for (entity, rect) in locations {
            self.add_to_cells(entity, &rect);
        }
        log::debug!(
            "[SpatialGrid] Rebuilt {} entities into {cols}x{rows} cells of size {}",
            self.locations.len(),
            self.cell_size
        );
    }

    fn cell_coord(&self, value: f32, origin: f32, limit: usize) -> usize {
        let cell = ((value - origin) / self.cell_size).floor();
        if cell <= 0.0 {
            0
        } else {
            (cell as usize).min(limit - 1)
        }
    }

    fn cell_range(&self, rect: &Rect) -> CellRange {
        CellRange {
            min_col: self.cell_coord(rect.min.x, self.bounds.min.x, self.cols),
            max_col: self.cell_coord(rect.max.x, self.bounds.min.x, self.cols),
            min_row: self.cell_coord(rect.min.y, self.bounds.min.y, self.rows),
            max_row: self.cell_coord(rect.max.y, self.bounds.min.y, self.rows),
        }
    }

    /// Cell containing `point`, clamped to the grid
    pub fn cell_at(&self, point: Vec2) -> (usize, usize) {
        (
            self.cell_coord(point.x, self.bounds.min.x, self.cols),
            self.cell_coord(point.y, self.bounds.min.y, self.rows),
        )
    }

    fn add_to_cells(&mut self, entity: Entity, rect: &Rect) {
        for (col, row) in self.cell_range(rect).cells() {
            self.cells[row * self.cols + col].push(entity);
        }
    }
}

impl SpatialIndex for SpatialGrid {
    fn insert(&mut self, entity: Entity, bounds: Rect) -> bool {
        self.remove(entity);

        if !self.bounds.intersects(&bounds) {
            log::warn!("[SpatialGrid] Entity {entity} at {bounds:?} is outside the world bounds, not indexed");
            return false;
        }

        self.add_to_cells(entity, &bounds);
        self.locations.insert(entity, bounds);
        if self.debug {
            let range = self.cell_range(&bounds);
            log::debug!("[SpatialGrid] Inserted {entity} into cells {range:?}");
        }
        true
    }

    fn remove(&mut self, entity: Entity) -> bool {
        let Some(rect) = self.locations.remove(&entity) else {
            return false;
        };

        for (col, row) in self.cell_range(&rect).cells() {
            let cell = &mut self.cells[row * self.cols + col];
            if let Some(position) = cell.iter().position(|e| *e == entity) {
                cell.swap_remove(position);
            }
        }
        true
    }

    fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.locations.clear();
    }

    fn query(&self, area: &Rect) -> Vec<Entity> {
        // Boxes may overhang the world edge, so an area outside the bounds can still hit the edge cells
        let candidates: BTreeSet<Entity> = self
            .cell_range(area)
            .cells()
            .flat_map(|(col, row)| self.cells[row * self.cols + col].iter().copied())
            .collect();

        candidates
            .into_iter()
            .filter(|entity| self.locations.get(entity).is_some_and(|rect| rect.intersects(area)))
            .collect()
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
        self.bounds
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
