//! Grid statistics and composition phase

use serde::Serialize;

use crate::grid::Grid;

/// Counts shown alongside the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridStats {
    /// Placed notes
    pub total: usize,
    /// Columns holding at least one note
    pub active_columns: usize,
    pub columns: usize,
    pub empty_cells: usize,
    /// `total / cell_count`, in [0, 1]
    pub fill_ratio: f64,
}

/// How full the canvas is, in four named stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Sparse,
    Emergent,
    Dense,
    Full,
}

impl Phase {
    /// Phase for a fill ratio (thresholds 0.15 / 0.40 / 0.70)
    pub fn from_fill_ratio(ratio: f64) -> Self {
        if ratio < 0.15 {
            Phase::Sparse
        } else if ratio < 0.40 {
            Phase::Emergent
        } else if ratio < 0.70 {
            Phase::Dense
        } else {
            Phase::Full
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Phase::Sparse => "Sparse · Airy",
            Phase::Emergent => "Emergent · Rhythmic",
            Phase::Dense => "Dense · Cohesive",
            Phase::Full => "Full · Ceremonial",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Phase::Sparse => {
                "The canvas is nearly empty. Early notes echo in the silence, each one standing alone."
            }
            Phase::Emergent => "Patterns begin to form. Columns fill, the melody gains a pulse.",
            Phase::Dense => "The grid thickens. Harmony emerges from the collective placement.",
            Phase::Full => {
                "Nearly complete. The canvas approaches its final form. The premiere draws near."
            }
        }
    }
}

/// Compute statistics for a grid
pub fn grid_stats(grid: &Grid) -> GridStats {
    let cell_count = grid.dimensions().cell_count();
    let total = grid.occupied_count();
    let active_columns = (0..grid.columns())
        .filter(|&c| (0..grid.rows()).any(|r| grid.is_occupied(r, c)))
        .count();

    GridStats {
        total,
        active_columns,
        columns: grid.columns(),
        empty_cells: cell_count - total,
        fill_ratio: if cell_count == 0 {
            0.0
        } else {
            total as f64 / cell_count as f64
        },
    }
}

impl GridStats {
    pub fn phase(&self) -> Phase {
        Phase::from_fill_ratio(self.fill_ratio)
    }
}
