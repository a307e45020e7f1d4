//! The logical cell grid: a dense row-major field of ASCII cell symbols.
//!
//! Grid dimensions are carried on the wire as single unsigned bytes, so both
//! axes are capped at 255. That is a hard protocol limit, not a tunable.

use rand::Rng;
use thiserror::Error;

use crate::time::Timestamp;

/// Hard protocol cap on rows and columns (one byte each on the wire).
pub const MAX_DIM: usize = 255;

/// Symbol for a dead cell.
pub const DEAD: u8 = b'0';

/// Symbol for a live cell.
pub const ALIVE: u8 = b'1';

/// Errors constructing or reshaping a grid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Zero-size grids are invalid.
    #[error("grid dimensions must be non-zero")]
    ZeroDimension,
    /// Either axis exceeds the one-byte wire cap.
    #[error("grid dimensions {rows}x{cols} exceed the {MAX_DIM}x{MAX_DIM} protocol limit")]
    DimensionOutOfRange { rows: usize, cols: usize },
    /// Cell data does not match `rows * cols`.
    #[error("expected {expected} cells, got {got}")]
    CellCountMismatch { expected: usize, got: usize },
}

/// Converts a cell value to its ASCII symbol.
///
/// `0..=9` map to `'0'..='9'`, `10..=15` to `'A'..='F'`. Values above 15 keep
/// walking up the alphabet (27 prints as an out-of-range letter); that is an
/// accepted artifact of summing many sources, not saturated away.
#[inline]
#[must_use]
pub fn nibble_to_ascii(value: u32) -> u8 {
    if value < 10 {
        (u32::from(b'0') + value) as u8
    } else {
        (u32::from(b'A') + value - 10) as u8
    }
}

/// Converts an ASCII cell symbol back to its numeric value.
///
/// Inverse of [`nibble_to_ascii`] over its output range.
#[inline]
#[must_use]
pub fn symbol_value(symbol: u8) -> u32 {
    if symbol < b'A' {
        u32::from(symbol.wrapping_sub(b'0'))
    } else {
        u32::from(symbol - b'A') + 10
    }
}

/// A snapshot of one source's cell field.
///
/// Cells are ASCII symbols, row-major, `rows * cols` of them. The sequence
/// number increases monotonically per source; the timestamp records capture
/// time and travels the wire as an opaque blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalGrid {
    rows: u8,
    cols: u8,
    seq: u32,
    stamp: Timestamp,
    cells: Vec<u8>,
}

impl LogicalGrid {
    /// Builds a grid from caller-supplied cells.
    ///
    /// # Errors
    ///
    /// Rejects zero or over-255 dimensions and cell counts that do not match
    /// `rows * cols`.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<u8>) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::ZeroDimension);
        }
        if rows > MAX_DIM || cols > MAX_DIM {
            return Err(GridError::DimensionOutOfRange { rows, cols });
        }
        let expected = rows * cols;
        if cells.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                got: cells.len(),
            });
        }
        Ok(Self {
            rows: rows as u8,
            cols: cols as u8,
            seq: 0,
            stamp: Timestamp::default(),
            cells,
        })
    }

    /// Builds a grid filled with a random pattern of live and dead cells.
    ///
    /// # Errors
    ///
    /// Rejects zero or over-255 dimensions.
    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::ZeroDimension);
        }
        if rows > MAX_DIM || cols > MAX_DIM {
            return Err(GridError::DimensionOutOfRange { rows, cols });
        }
        let cells = (0..rows * cols)
            .map(|_| if rng.gen_bool(0.5) { ALIVE } else { DEAD })
            .collect();
        Ok(Self {
            rows: rows as u8,
            cols: cols as u8,
            seq: 0,
            stamp: Timestamp::default(),
            cells,
        })
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> u8 {
        self.rows
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub const fn cols(&self) -> u8 {
        self.cols
    }

    /// Sequence number of this snapshot.
    #[inline]
    #[must_use]
    pub const fn seq(&self) -> u32 {
        self.seq
    }

    /// Capture timestamp of this snapshot.
    #[inline]
    #[must_use]
    pub const fn stamp(&self) -> Timestamp {
        self.stamp
    }

    /// Row-major cell symbols.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// The symbol at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of range.
    #[inline]
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        assert!(row < usize::from(self.rows) && col < usize::from(self.cols));
        self.cells[row * usize::from(self.cols) + col]
    }

    /// Assigns the sequence number.
    #[inline]
    pub fn set_seq(&mut self, seq: u32) {
        self.seq = seq;
    }

    /// Assigns the capture timestamp.
    #[inline]
    pub fn set_stamp(&mut self, stamp: Timestamp) {
        self.stamp = stamp;
    }

    /// Returns one row of symbols, for display.
    #[must_use]
    pub fn row(&self, row: usize) -> &[u8] {
        let cols = usize::from(self.cols);
        &self.cells[row * cols..(row + 1) * cols]
    }

    /// Flips roughly 10% of the cells between dead and alive.
    ///
    /// Walks the field in random strides of at most one fifth of the cell
    /// count, toggling the cell at each stop, so the expected flip distance
    /// is one tenth of the field.
    pub fn mutate<R: Rng>(&mut self, rng: &mut R) {
        let len = self.cells.len();
        let range = (len / 5).max(1);
        let mut cell = rng.gen_range(0..range);
        while cell < len {
            self.cells[cell] = if self.cells[cell] == DEAD { ALIVE } else { DEAD };
            cell += rng.gen_range(0..range) + 1;
        }
    }

    pub(crate) fn from_parts(rows: u8, cols: u8, cells: Vec<u8>) -> Self {
        debug_assert_eq!(cells.len(), usize::from(rows) * usize::from(cols));
        Self {
            rows,
            cols,
            seq: 0,
            stamp: Timestamp::default(),
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn nibble_symbols() {
        assert_eq!(nibble_to_ascii(0), b'0');
        assert_eq!(nibble_to_ascii(9), b'9');
        assert_eq!(nibble_to_ascii(10), b'A');
        assert_eq!(nibble_to_ascii(15), b'F');
        // Out-of-range values keep walking up the alphabet.
        assert_eq!(nibble_to_ascii(16), b'G');
    }

    #[test]
    fn symbol_values_invert_symbols() {
        for value in 0..16 {
            assert_eq!(symbol_value(nibble_to_ascii(value)), value);
        }
    }

    #[test]
    fn from_cells_validates_shape() {
        assert_eq!(
            LogicalGrid::from_cells(0, 4, Vec::new()),
            Err(GridError::ZeroDimension)
        );
        assert_eq!(
            LogicalGrid::from_cells(300, 1, vec![DEAD; 300]),
            Err(GridError::DimensionOutOfRange { rows: 300, cols: 1 })
        );
        assert_eq!(
            LogicalGrid::from_cells(2, 2, vec![DEAD; 3]),
            Err(GridError::CellCountMismatch { expected: 4, got: 3 })
        );
    }

    #[test]
    fn random_fill_is_all_cell_symbols() {
        let mut rng = StdRng::seed_from_u64(7);
        let grid = LogicalGrid::random(5, 9, &mut rng).unwrap();
        assert_eq!(grid.rows(), 5);
        assert_eq!(grid.cols(), 9);
        assert!(grid.cells().iter().all(|&c| c == DEAD || c == ALIVE));
    }

    #[test]
    fn mutate_flips_some_cells() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut grid = LogicalGrid::random(10, 10, &mut rng).unwrap();
        let before = grid.cells().to_vec();
        grid.mutate(&mut rng);
        let flipped = before
            .iter()
            .zip(grid.cells())
            .filter(|(a, b)| a != b)
            .count();
        assert!(flipped > 0);
        assert!(flipped < before.len());
    }

    #[test]
    fn mutate_tiny_grid_does_not_panic() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut grid = LogicalGrid::from_cells(1, 2, vec![DEAD, ALIVE]).unwrap();
        grid.mutate(&mut rng);
        assert!(grid.cells().iter().all(|&c| c == DEAD || c == ALIVE));
    }
}
