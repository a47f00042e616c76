//! Grid state and versioned snapshots
//!
//! The grid is a row-major array of optional cells: `cell(row, column)` is
//! `Some(Cell)` once a note has been placed there. Cells are permanent once
//! placed; clearing the whole grid is the only removal path.
//!
//! **Ownership:** the application layer owns a [`GridStore`]. Every mutation
//! publishes a new [`GridSnapshot`] with a bumped version, so collaborators
//! (compiler, scheduler, HTTP readers) hold an immutable `Arc<GridSnapshot>`
//! instead of aliasing a mutable grid that may be replaced underneath them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::colors::COLOR_COUNT;
use crate::{Error, Result};

/// Default canvas width (columns = time steps)
pub const GRID_COLS: usize = 50;

/// Default canvas height (rows = pitch positions)
pub const GRID_ROWS: usize = 50;

/// Grid size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub rows: usize,
    pub columns: usize,
}

impl GridDimensions {
    pub const fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns }
    }

    pub const fn cell_count(&self) -> usize {
        self.rows * self.columns
    }
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self::new(GRID_ROWS, GRID_COLS)
    }
}

/// A placed note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Index into [`crate::colors::COLORS`]
    pub color_index: usize,
}

/// Occupied cell with its coordinates (for listing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacedCell {
    pub row: usize,
    pub column: usize,
    pub color_index: usize,
}

/// Placement grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    dimensions: GridDimensions,
    cells: Vec<Option<Cell>>,
}

impl Grid {
    /// Create an empty grid of the given size
    pub fn new(dimensions: GridDimensions) -> Self {
        Self {
            dimensions,
            cells: vec![None; dimensions.cell_count()],
        }
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    pub fn rows(&self) -> usize {
        self.dimensions.rows
    }

    pub fn columns(&self) -> usize {
        self.dimensions.columns
    }

    fn offset(&self, row: usize, column: usize) -> Option<usize> {
        (row < self.dimensions.rows && column < self.dimensions.columns)
            .then(|| row * self.dimensions.columns + column)
    }

    /// Cell at (row, column); `None` when empty or out of bounds
    pub fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        self.offset(row, column).and_then(|i| self.cells[i])
    }

    pub fn is_occupied(&self, row: usize, column: usize) -> bool {
        self.cell(row, column).is_some()
    }

    /// Place a note
    ///
    /// # Errors
    /// - `OutOfBounds` if (row, column) is outside the grid
    /// - `UnknownColor` if `color_index` is not in the catalog
    /// - `CellOccupied` if a note is already there (cells are permanent)
    pub fn place(&mut self, row: usize, column: usize, color_index: usize) -> Result<()> {
        let offset = self.offset(row, column).ok_or(Error::OutOfBounds {
            row,
            column,
            rows: self.dimensions.rows,
            columns: self.dimensions.columns,
        })?;

        if color_index >= COLOR_COUNT {
            return Err(Error::UnknownColor(color_index));
        }

        let slot = &mut self.cells[offset];
        if slot.is_some() {
            return Err(Error::CellOccupied { row, column });
        }
        *slot = Some(Cell { color_index });
        Ok(())
    }

    /// Remove every note
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// Occupied rows of one column, ascending by row, with their colors
    pub fn column_notes(&self, column: usize) -> Vec<(usize, Cell)> {
        (0..self.dimensions.rows)
            .filter_map(|row| self.cell(row, column).map(|cell| (row, cell)))
            .collect()
    }

    /// All occupied cells in row-major order
    pub fn placed_cells(&self) -> Vec<PlacedCell> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| {
                cell.map(|c| PlacedCell {
                    row: i / self.dimensions.columns,
                    column: i % self.dimensions.columns,
                    color_index: c.color_index,
                })
            })
            .collect()
    }

    /// Total number of placed notes
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GridDimensions::default())
    }
}

/// Scatter up to `count` random notes so the canvas isn't empty on first load
///
/// Picks that land on an occupied cell are skipped, so fewer than `count`
/// notes may be added. Returns how many were actually placed.
pub fn seed_demo_notes<R: Rng + ?Sized>(grid: &mut Grid, count: usize, rng: &mut R) -> usize {
    let GridDimensions { rows, columns } = grid.dimensions();
    if rows == 0 || columns == 0 {
        return 0;
    }

    let mut placed = 0;
    for _ in 0..count {
        let row = rng.gen_range(0..rows);
        let column = rng.gen_range(0..columns);
        let color_index = rng.gen_range(0..COLOR_COUNT);
        if grid.place(row, column, color_index).is_ok() {
            placed += 1;
        }
    }
    placed
}

/// Immutable grid state at a given version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSnapshot {
    pub version: u64,
    pub grid: Grid,
}

/// Owner of the current grid
///
/// Mutations produce a new snapshot; previously handed-out snapshots stay
/// valid and unchanged.
#[derive(Debug)]
pub struct GridStore {
    current: Arc<GridSnapshot>,
}

impl GridStore {
    pub fn new(dimensions: GridDimensions) -> Self {
        Self {
            current: Arc::new(GridSnapshot {
                version: 0,
                grid: Grid::new(dimensions),
            }),
        }
    }

    /// Current snapshot (cheap clone of the Arc)
    pub fn snapshot(&self) -> Arc<GridSnapshot> {
        Arc::clone(&self.current)
    }

    pub fn version(&self) -> u64 {
        self.current.version
    }

    fn publish(&mut self, grid: Grid) -> Arc<GridSnapshot> {
        let version = self.current.version + 1;
        debug!("Publishing grid snapshot v{}", version);
        self.current = Arc::new(GridSnapshot { version, grid });
        self.snapshot()
    }

    /// Place a note and publish the resulting snapshot
    pub fn place(&mut self, row: usize, column: usize, color_index: usize) -> Result<Arc<GridSnapshot>> {
        let mut grid = self.current.grid.clone();
        grid.place(row, column, color_index)?;
        Ok(self.publish(grid))
    }

    /// Replace the grid with an empty one of the same size
    pub fn clear(&mut self) -> Arc<GridSnapshot> {
        let grid = Grid::new(self.current.grid.dimensions());
        self.publish(grid)
    }

    /// Seed demo notes into the current grid
    pub fn seed<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Arc<GridSnapshot> {
        let mut grid = self.current.grid.clone();
        let placed = seed_demo_notes(&mut grid, count, rng);
        debug!("Seeded {} demo notes", placed);
        self.publish(grid)
    }
}

impl Default for GridStore {
    fn default() -> Self {
        Self::new(GridDimensions::default())
    }
}
