//! Per-source floating-point accumulator state.

use crate::time::Timestamp;

/// The decoded, per-source accumulator held by the registry.
///
/// Cells are floats so a silent source can fade: every merge cycle it fails
/// to produce new data, its cells are halved in place. The `updated` flag
/// records whether fresh data arrived since the previous merge and is reset
/// by every merge.
///
/// Each buffer is owned exclusively by its registry entry and replaced
/// wholesale when a newer snapshot is accepted; an update with different
/// dimensions simply replaces the shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBuffer {
    rows: u8,
    cols: u8,
    seq: u32,
    stamp: Timestamp,
    updated: bool,
    cells: Vec<f32>,
}

impl SourceBuffer {
    /// Builds a buffer from freshly decoded frame fields, `updated` set.
    pub(crate) fn from_decoded(
        rows: u8,
        cols: u8,
        seq: u32,
        stamp: Timestamp,
        cells: Vec<f32>,
    ) -> Self {
        debug_assert_eq!(cells.len(), usize::from(rows) * usize::from(cols));
        Self {
            rows,
            cols,
            seq,
            stamp,
            updated: true,
            cells,
        }
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

    /// Sequence number of the snapshot this buffer holds.
    #[inline]
    #[must_use]
    pub const fn seq(&self) -> u32 {
        self.seq
    }

    /// Capture timestamp of the held snapshot.
    #[inline]
    #[must_use]
    pub const fn stamp(&self) -> Timestamp {
        self.stamp
    }

    /// Whether fresh data arrived since the previous merge.
    #[inline]
    #[must_use]
    pub const fn updated(&self) -> bool {
        self.updated
    }

    /// Row-major float cells.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Halves every cell in place, the aging step for silent sources.
    pub(crate) fn age(&mut self) {
        for cell in &mut self.cells {
            *cell /= 2.0;
        }
    }

    /// Clears the `updated` flag, arming the next cycle's aging check.
    pub(crate) fn reset_updated(&mut self) {
        self.updated = false;
    }
}
