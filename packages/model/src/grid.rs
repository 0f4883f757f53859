//! # Grid Storage
//!
//! Two-dimensional child storage for GRID-placement elements (tables, matrix
//! operators). Cells are stored row-major and are always fully populated:
//! there is no notion of a missing cell, only placeholder-filled ones.
//!
//! Out-of-range indices and dimension mismatches are contract violations and
//! panic; callers check dimensions first.

use crate::element::Element;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridStore {
    rows: usize,
    columns: usize,
    cells: Vec<Element>, // row-major, len == rows * columns
}

impl GridStore {
    pub fn new(rows: usize, columns: usize, cells: Vec<Element>) -> Self {
        assert_eq!(
            cells.len(),
            rows * columns,
            "grid cell count must equal rows * columns"
        );
        Self {
            rows,
            columns,
            cells,
        }
    }

    pub fn empty() -> Self {
        Self {
            rows: 0,
            columns: 0,
            cells: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Element] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Element] {
        &mut self.cells
    }

    fn linear(&self, row: usize, column: usize) -> usize {
        assert!(
            row < self.rows && column < self.columns,
            "grid index ({}, {}) out of range for {}x{} grid",
            row,
            column,
            self.rows,
            self.columns
        );
        row * self.columns + column
    }

    /// Convert a linear cell index back into (row, column)
    pub fn position_of(&self, index: usize) -> (usize, usize) {
        assert!(index < self.cells.len(), "grid cell index out of range");
        (index / self.columns, index % self.columns)
    }

    pub fn cell(&self, row: usize, column: usize) -> &Element {
        &self.cells[self.linear(row, column)]
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> &mut Element {
        let index = self.linear(row, column);
        &mut self.cells[index]
    }

    /// Swap a cell's content, returning the old element
    pub fn replace_cell(&mut self, row: usize, column: usize, element: Element) -> Element {
        let index = self.linear(row, column);
        std::mem::replace(&mut self.cells[index], element)
    }

    pub fn row_cells(&self, row: usize) -> impl Iterator<Item = &Element> {
        assert!(row < self.rows, "grid row out of range");
        self.cells[row * self.columns..(row + 1) * self.columns].iter()
    }

    pub fn column_cells(&self, column: usize) -> impl Iterator<Item = &Element> {
        assert!(column < self.columns, "grid column out of range");
        self.cells
            .iter()
            .skip(column)
            .step_by(self.columns.max(1))
    }

    /// Insert a row before `row` (== rows() appends)
    pub fn insert_row(&mut self, row: usize, cells: Vec<Element>) {
        assert!(row <= self.rows, "grid row insertion point out of range");
        assert_eq!(
            cells.len(),
            self.columns,
            "inserted row must have one cell per column"
        );
        let at = row * self.columns;
        self.cells.splice(at..at, cells);
        self.rows += 1;
    }

    pub fn remove_row(&mut self, row: usize) -> Vec<Element> {
        assert!(row < self.rows, "grid row out of range");
        let at = row * self.columns;
        let removed: Vec<Element> = self.cells.drain(at..at + self.columns).collect();
        self.rows -= 1;
        if self.rows == 0 {
            self.columns = 0;
        }
        removed
    }

    /// Insert a column before `column` (== columns() appends)
    pub fn insert_column(&mut self, column: usize, cells: Vec<Element>) {
        assert!(
            column <= self.columns,
            "grid column insertion point out of range"
        );
        assert_eq!(
            cells.len(),
            self.rows,
            "inserted column must have one cell per row"
        );
        for (row, cell) in cells.into_iter().enumerate().rev() {
            self.cells.insert(row * self.columns + column, cell);
        }
        self.columns += 1;
    }

    pub fn remove_column(&mut self, column: usize) -> Vec<Element> {
        assert!(column < self.columns, "grid column out of range");
        let mut removed = Vec::with_capacity(self.rows);
        for row in 0..self.rows {
            // Indices shift left by one per removed predecessor
            removed.push(self.cells.remove(row * (self.columns - 1) + column));
        }
        self.columns -= 1;
        if self.columns == 0 {
            self.rows = 0;
        }
        removed
    }
}
