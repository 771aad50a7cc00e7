// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

/// Coordinate of one cell in a tabular source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: usize,
    pub column: usize,
}

impl CellRef {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// The same cell with its axes swapped.
    pub const fn transposed(self) -> Self {
        Self {
            row: self.column,
            column: self.row,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Per-cell capabilities exposed by a tabular source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFlags {
    pub editable: bool,
    pub selectable: bool,
    pub enabled: bool,
}

impl CellFlags {
    pub const fn none() -> Self {
        Self {
            editable: false,
            selectable: false,
            enabled: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            editable: true,
            selectable: true,
            enabled: true,
        }
    }

    /// Selectable and enabled but not editable.
    pub const fn read_only() -> Self {
        Self {
            editable: false,
            selectable: true,
            enabled: true,
        }
    }

    pub const fn is_empty(self) -> bool {
        !self.editable && !self.selectable && !self.enabled
    }
}

/// A flat grid of string cells addressed by (row, column), with header text
/// on both axes and per-cell capability flags.
pub trait TabularSource {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    /// Display value of one cell. None for an out-of-range coordinate.
    fn cell(&self, at: CellRef) -> Option<String>;

    /// Writes one cell. Returns false when the coordinate is out of range or
    /// the source rejects the write.
    fn set_cell(&mut self, at: CellRef, value: &str) -> bool;

    /// Header text for one section of the given axis.
    fn header(&self, axis: Axis, section: usize) -> Option<String>;

    fn contains(&self, at: CellRef) -> bool {
        at.row < self.row_count() && at.column < self.column_count()
    }

    fn cell_flags(&self, at: CellRef) -> CellFlags {
        if self.contains(at) {
            CellFlags::all()
        } else {
            CellFlags::none()
        }
    }
}

/// The editable-model surface the application shell drives: re-query,
/// buffered submit/revert, row insertion and removal, and the dirty flag.
pub trait EditableTable: TabularSource {
    /// Re-reads rows from the backing source, discarding pending changes.
    fn select(&mut self) -> Result<()>;

    /// Pushes pending edits, inserts, and removals to the backing source.
    /// On failure pending changes are kept so the caller can revert.
    fn submit_all(&mut self) -> Result<()>;

    /// Discards pending changes and restores the last selected snapshot.
    fn revert_all(&mut self);

    /// Appends a pending row. Returns false when the value count does not
    /// match the column count.
    fn insert_row(&mut self, values: Vec<String>) -> bool;

    /// Marks a row for removal on the next submit. Returns false for an
    /// out-of-range row.
    fn remove_row(&mut self, row: usize) -> bool;

    fn is_dirty(&self) -> bool;
}

/// In-memory tabular source with submit/revert semantics. Backs unit tests
/// and scratch models that never touch storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryGrid {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    baseline: Vec<Vec<String>>,
}

impl MemoryGrid {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            baseline: Vec::new(),
        }
    }

    pub fn with_rows<I, S>(columns: I, rows: Vec<Vec<String>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut grid = Self::new(columns);
        grid.baseline = rows.clone();
        grid.rows = rows;
        grid
    }

    pub fn push_row(&mut self, values: Vec<String>) -> bool {
        self.insert_row(values)
    }
}

impl TabularSource for MemoryGrid {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn cell(&self, at: CellRef) -> Option<String> {
        self.rows.get(at.row)?.get(at.column).cloned()
    }

    fn set_cell(&mut self, at: CellRef, value: &str) -> bool {
        match self.rows.get_mut(at.row).and_then(|row| row.get_mut(at.column)) {
            Some(cell) => {
                *cell = value.to_owned();
                true
            }
            None => false,
        }
    }

    fn header(&self, axis: Axis, section: usize) -> Option<String> {
        match axis {
            Axis::Horizontal => self.columns.get(section).cloned(),
            Axis::Vertical => (section < self.rows.len()).then(|| (section + 1).to_string()),
        }
    }
}

impl EditableTable for MemoryGrid {
    fn select(&mut self) -> Result<()> {
        self.rows = self.baseline.clone();
        Ok(())
    }

    fn submit_all(&mut self) -> Result<()> {
        self.baseline = self.rows.clone();
        Ok(())
    }

    fn revert_all(&mut self) {
        self.rows = self.baseline.clone();
    }

    fn insert_row(&mut self, values: Vec<String>) -> bool {
        if values.len() != self.columns.len() {
            return false;
        }
        self.rows.push(values);
        true
    }

    fn remove_row(&mut self, row: usize) -> bool {
        if row >= self.rows.len() {
            return false;
        }
        self.rows.remove(row);
        true
    }

    fn is_dirty(&self) -> bool {
        self.rows != self.baseline
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, CellFlags, CellRef, EditableTable, MemoryGrid, TabularSource};

    fn sample() -> MemoryGrid {
        MemoryGrid::with_rows(
            ["Id", "Name"],
            vec![
                vec!["1".to_owned(), "Jane Doe".to_owned()],
                vec!["2".to_owned(), "John Roe".to_owned()],
            ],
        )
    }

    #[test]
    fn cell_ref_transposed_swaps_axes() {
        assert_eq!(CellRef::new(3, 7).transposed(), CellRef::new(7, 3));
        assert_eq!(CellRef::new(0, 0).transposed(), CellRef::new(0, 0));
    }

    #[test]
    fn axis_flipped_is_involutive() {
        assert_eq!(Axis::Horizontal.flipped(), Axis::Vertical);
        assert_eq!(Axis::Vertical.flipped().flipped(), Axis::Vertical);
    }

    #[test]
    fn flags_presets() {
        assert!(CellFlags::none().is_empty());
        assert!(!CellFlags::all().is_empty());
        assert!(!CellFlags::read_only().editable);
        assert!(CellFlags::read_only().selectable);
    }

    #[test]
    fn default_flags_follow_bounds() {
        let grid = sample();
        assert_eq!(grid.cell_flags(CellRef::new(1, 1)), CellFlags::all());
        assert_eq!(grid.cell_flags(CellRef::new(2, 0)), CellFlags::none());
        assert_eq!(grid.cell_flags(CellRef::new(0, 9)), CellFlags::none());
    }

    #[test]
    fn cells_and_headers() {
        let grid = sample();
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.cell(CellRef::new(0, 1)).as_deref(), Some("Jane Doe"));
        assert_eq!(grid.cell(CellRef::new(5, 0)), None);
        assert_eq!(grid.header(Axis::Horizontal, 1).as_deref(), Some("Name"));
        assert_eq!(grid.header(Axis::Vertical, 0).as_deref(), Some("1"));
        assert_eq!(grid.header(Axis::Vertical, 2), None);
    }

    #[test]
    fn set_cell_marks_dirty_and_revert_restores() {
        let mut grid = sample();
        assert!(!grid.is_dirty());
        assert!(grid.set_cell(CellRef::new(0, 1), "Janet Doe"));
        assert!(grid.is_dirty());

        grid.revert_all();
        assert!(!grid.is_dirty());
        assert_eq!(grid.cell(CellRef::new(0, 1)).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn submit_all_becomes_new_baseline() {
        let mut grid = sample();
        grid.set_cell(CellRef::new(1, 1), "J. Roe");
        grid.submit_all().expect("memory submit");
        assert!(!grid.is_dirty());

        grid.revert_all();
        assert_eq!(grid.cell(CellRef::new(1, 1)).as_deref(), Some("J. Roe"));
    }

    #[test]
    fn insert_row_validates_width() {
        let mut grid = sample();
        assert!(!grid.insert_row(vec!["only-one".to_owned()]));
        assert!(grid.insert_row(vec!["3".to_owned(), "New".to_owned()]));
        assert_eq!(grid.row_count(), 3);
        assert!(grid.is_dirty());
    }

    #[test]
    fn remove_row_checks_bounds() {
        let mut grid = sample();
        assert!(!grid.remove_row(9));
        assert!(grid.remove_row(0));
        assert_eq!(grid.cell(CellRef::new(0, 1)).as_deref(), Some("John Roe"));
    }

    #[test]
    fn out_of_range_set_cell_is_rejected() {
        let mut grid = sample();
        assert!(!grid.set_cell(CellRef::new(0, 7), "x"));
        assert!(!grid.is_dirty());
    }
}
