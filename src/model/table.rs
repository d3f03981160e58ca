//! Table types.

use super::Paragraph;
use serde::{Deserialize, Serialize};

/// A table structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Rows in the table
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of grid columns (widest row, counting spans).
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.cells.iter().map(|c| c.colspan.max(1) as usize).sum())
            .max()
            .unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over every paragraph of every cell, row by row.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.rows
            .iter()
            .flat_map(|r| &r.cells)
            .flat_map(|c| &c.paragraphs)
    }

    /// Get cell texts, row by row.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.cells.iter().map(|c| c.plain_text()).collect())
            .collect()
    }
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in the row
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Create a row from cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self { cells }
    }
}

/// Vertical merge state of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalMerge {
    #[default]
    None,
    /// First cell of a vertically merged range
    Restart,
    /// Covered by the cell above
    Continue,
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell content
    pub paragraphs: Vec<Paragraph>,

    /// Grid columns spanned
    pub colspan: u32,

    /// Vertical merge state
    pub vertical_merge: VerticalMerge,
}

impl TableCell {
    /// Create a new empty cell.
    pub fn new() -> Self {
        Self {
            paragraphs: Vec::new(),
            colspan: 1,
            vertical_merge: VerticalMerge::None,
        }
    }

    /// Create a cell holding one paragraph of text.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut cell = Self::new();
        cell.paragraphs.push(Paragraph::with_text(text));
        cell
    }

    /// Get plain text of the cell, paragraphs joined by newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for TableCell {
    fn default() -> Self {
        Self::new()
    }
}
