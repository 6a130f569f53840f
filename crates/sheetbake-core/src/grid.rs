//! Raw cell grid backing one physical page of a sheet

use serde::{Deserialize, Serialize};

/// A two-dimensional grid of optional text cells.
///
/// Writes auto-expand the grid, so setting any (col, row) coordinate
/// succeeds; reading outside the current bounds returns `None` rather
/// than failing. Typed interpretation of cell text happens later,
/// during record conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGrid {
    rows: Vec<Vec<Option<String>>>,
}

impl RawGrid {
    /// Create a new empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell's text, or `None` if absent or out of bounds
    pub fn cell(&self, col: usize, row: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }

    /// Set a cell, appending empty rows and columns as needed
    pub fn set_cell(&mut self, col: usize, row: usize, value: impl Into<String>) {
        while self.rows.len() <= row {
            self.rows.push(Vec::new());
        }
        let r = &mut self.rows[row];
        while r.len() <= col {
            r.push(None);
        }
        r[col] = Some(value.into());
    }

    /// Append a full row of cells
    pub fn push_row(&mut self, cells: Vec<Option<String>>) {
        self.rows.push(cells);
    }

    /// Iterate over rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[Option<String>]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Number of rows currently in the grid
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check whether the grid holds no rows at all
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
