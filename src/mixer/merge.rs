//! Merging all registered buffers into one composite grid.

use std::collections::TryReserveError;
use std::hash::Hash;

use thiserror::Error;

use crate::grid::{LogicalGrid, nibble_to_ascii};
use crate::mixer::SourceRegistry;
use crate::trace;

/// Errors producing a composite grid.
#[derive(Debug, Error)]
pub enum MergeError {
    /// No sources are registered; callers skip the cycle.
    #[error("no sources registered")]
    Empty,
    /// Accumulator or output cells could not be allocated.
    #[error("allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

/// Folds all registered buffers into one composite grid per cycle.
///
/// The float accumulator is owned here and reused across cycles, so steady
/// state merges allocate only the output cells.
#[derive(Debug, Default)]
pub struct Mixer {
    accum: Vec<f32>,
}

impl Mixer {
    /// New mixer with an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges every registered buffer into a composite grid.
    ///
    /// The composite spans `max(rows) x max(cols)` over all buffers. Each
    /// buffer whose `updated` flag is still clear from the previous cycle is
    /// aged (cells halved in place) before it contributes; afterwards every
    /// flag is cleared for the next cycle. Buffers sum into the accumulator
    /// top-left aligned, contributing zero outside their own extent. Each
    /// accumulated cell is rounded to the nearest non-negative integer and
    /// mapped to its ASCII symbol; sums above 15 produce out-of-range
    /// symbols rather than saturating.
    ///
    /// The returned grid carries a zero sequence number and timestamp; both
    /// are the caller's to assign.
    ///
    /// # Errors
    ///
    /// [`MergeError::Empty`] when the registry holds no sources, or
    /// [`MergeError::Alloc`] when the cycle's memory cannot be reserved.
    pub fn merge<I: Eq + Hash>(
        &mut self,
        registry: &mut SourceRegistry<I>,
    ) -> Result<LogicalGrid, MergeError> {
        if registry.is_empty() {
            return Err(MergeError::Empty);
        }

        let mut rows = 0usize;
        let mut cols = 0usize;
        for buffer in registry.buffers() {
            rows = rows.max(usize::from(buffer.rows()));
            cols = cols.max(usize::from(buffer.cols()));
        }

        let count = rows * cols;
        self.accum.clear();
        self.accum.try_reserve(count)?;
        self.accum.resize(count, 0.0);

        for buffer in registry.buffers_mut() {
            if !buffer.updated() {
                buffer.age();
            }
            let buf_cols = usize::from(buffer.cols());
            for row in 0..usize::from(buffer.rows()) {
                for col in 0..buf_cols {
                    self.accum[row * cols + col] += buffer.cells()[row * buf_cols + col];
                }
            }
            buffer.reset_updated();
        }

        let mut cells = Vec::new();
        cells.try_reserve_exact(count)?;
        cells.extend(self.accum.iter().map(|&v| nibble_to_ascii(round_cell(v))));

        trace::debug!(rows, cols, sources = registry.len(), "merged composite");
        Ok(LogicalGrid::from_parts(rows as u8, cols as u8, cells))
    }
}

/// Rounds an accumulated cell to the nearest non-negative integer.
///
/// Negative inputs clamp to zero; they can only appear if upstream data is
/// malformed, since encoded cells are non-negative.
#[inline]
fn round_cell(value: f32) -> u32 {
    if value < 0.0 {
        0
    } else {
        (value + 0.5) as u32
    }
}
