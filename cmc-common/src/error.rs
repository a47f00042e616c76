//! Common error types for CMC

use thiserror::Error;

/// Common result type for CMC operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the CMC crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Placement targeted a cell that already holds a note
    #[error("Cell ({row}, {column}) is already occupied")]
    CellOccupied { row: usize, column: usize },

    /// Placement targeted a cell outside the grid
    #[error("Cell ({row}, {column}) is outside the {rows}x{columns} grid")]
    OutOfBounds {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },

    /// Color index does not exist in the catalog
    #[error("Unknown color index: {0}")]
    UnknownColor(usize),
}
