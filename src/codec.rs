//! Wire codec for packed grid frames.
//!
//! ## Wire Format
//!
//! One frame carries one grid snapshot. Multi-byte integers are **native**
//! byte order, a deliberate compatibility choice with the reference
//! protocol and a documented portability hazard between peers of differing
//! endianness or word width.
//!
//! | offset | len | field |
//! |--------|-----|-------|
//! | 0      | 1   | size marker (nibble mode only; zero in bit mode) |
//! | 1      | 16  | capture timestamp (secs `i64`, micros `i64`) |
//! | 17     | 4   | sequence number (`u32`) |
//! | 21     | 1   | row count |
//! | 22     | 1   | column count |
//! | 23     | ..  | cell payload |
//!
//! The payload packs cells row-major at 1 bit per cell (bit mode) or 4 bits
//! per cell (nibble mode), most-significant bit/nibble first within each
//! byte, padded with zero bits to a whole-byte boundary. Decoders consume
//! exactly `rows * cols` cells and ignore the pad.

use thiserror::Error;

use crate::grid::{GridError, LogicalGrid, nibble_to_ascii, symbol_value};
use crate::mixer::SourceBuffer;
use crate::time::{TIMESTAMP_LEN, Timestamp};

/// Offset of the size marker byte (meaningful in nibble mode only).
pub const SIZE_POS: usize = 0;
/// Offset of the capture timestamp.
pub const TS_POS: usize = 1;
/// Offset of the sequence number.
pub const SN_POS: usize = TS_POS + TIMESTAMP_LEN;
/// Offset of the row count.
pub const ROW_POS: usize = SN_POS + 4;
/// Offset of the column count.
pub const COL_POS: usize = ROW_POS + 1;
/// Offset of the first payload byte.
pub const CELL_POS: usize = COL_POS + 1;
/// Fixed header length; frames shorter than this cannot be decoded at all.
pub const HEADER_LEN: usize = CELL_POS;

/// Errors during frame encode/decode.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Frame shorter than the fixed header.
    #[error("frame truncated: {len} bytes, header needs {HEADER_LEN}")]
    TruncatedHeader { len: usize },
    /// Payload shorter than `rows * cols` cells require.
    #[error("payload inconsistent with dimensions: need {need} bytes, have {have}")]
    TruncatedPayload { need: usize, have: usize },
    /// Header carries invalid grid dimensions.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// Output buffer could not be allocated.
    #[error("allocation failed: {0}")]
    Alloc(#[from] std::collections::TryReserveError),
}

/// Header fields shared by every frame variant.
struct Header {
    stamp: Timestamp,
    seq: u32,
    rows: u8,
    cols: u8,
}

impl Header {
    /// Reads the fixed-offset header fields.
    ///
    /// Dimensions must be validated before the payload length can be, so
    /// this runs first on every decode path.
    fn read(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::TruncatedHeader { len: bytes.len() });
        }
        let mut seq = [0u8; 4];
        seq.copy_from_slice(&bytes[SN_POS..ROW_POS]);
        let header = Self {
            stamp: Timestamp::from_wire(&bytes[TS_POS..SN_POS]),
            seq: u32::from_ne_bytes(seq),
            rows: bytes[ROW_POS],
            cols: bytes[COL_POS],
        };
        if header.rows == 0 || header.cols == 0 {
            return Err(GridError::ZeroDimension.into());
        }
        Ok(header)
    }

    fn cell_count(&self) -> usize {
        usize::from(self.rows) * usize::from(self.cols)
    }

    /// Validates that the payload holds `cell_count` cells at `bits` bits
    /// per cell, returning the padded payload length in bytes.
    fn check_payload(&self, bytes: &[u8], bits: usize) -> Result<usize, CodecError> {
        let per_byte = 8 / bits;
        let payload_len = self.cell_count().div_ceil(per_byte);
        let need = HEADER_LEN + payload_len;
        if bytes.len() < need {
            return Err(CodecError::TruncatedPayload {
                need,
                have: bytes.len(),
            });
        }
        Ok(payload_len)
    }
}

/// Allocates the output frame and writes the fixed header.
fn write_header(grid: &LogicalGrid, payload_len: usize) -> Result<Vec<u8>, CodecError> {
    let total = HEADER_LEN + payload_len;
    let mut out = Vec::new();
    out.try_reserve_exact(total)?;
    out.resize(total, 0);
    out[TS_POS..SN_POS].copy_from_slice(&grid.stamp().to_wire());
    out[SN_POS..ROW_POS].copy_from_slice(&grid.seq().to_ne_bytes());
    out[ROW_POS] = grid.rows();
    out[COL_POS] = grid.cols();
    Ok(out)
}

/// Encodes a grid at 1 bit per cell.
///
/// Cell symbols other than `'0'`/`'1'` contribute only their low value bit,
/// matching the reference behavior for malformed cells.
///
/// # Errors
///
/// Returns [`CodecError::Alloc`] if the frame cannot be allocated.
pub fn encode_bits(grid: &LogicalGrid) -> Result<Vec<u8>, CodecError> {
    let cells = grid.cells();
    let mut out = write_header(grid, cells.len().div_ceil(8))?;
    for (i, &cell) in cells.iter().enumerate() {
        if cell.wrapping_sub(b'0') & 1 != 0 {
            out[CELL_POS + i / 8] |= 1 << (7 - i % 8);
        }
    }
    Ok(out)
}

/// Decodes a bit-mode frame into a grid of `'0'`/`'1'` symbols.
///
/// # Errors
///
/// Fails on a truncated header, zero dimensions, a payload shorter than
/// `rows * cols` bits, or allocation failure.
pub fn decode_bits(bytes: &[u8]) -> Result<LogicalGrid, CodecError> {
    let header = Header::read(bytes)?;
    header.check_payload(bytes, 1)?;
    let count = header.cell_count();
    let mut cells = Vec::new();
    cells.try_reserve_exact(count)?;
    for i in 0..count {
        let bit = (bytes[CELL_POS + i / 8] >> (7 - i % 8)) & 1;
        cells.push(b'0' + bit);
    }
    let mut grid = LogicalGrid::from_parts(header.rows, header.cols, cells);
    grid.set_seq(header.seq);
    grid.set_stamp(header.stamp);
    Ok(grid)
}

/// Decodes a bit-mode frame into a floating-point source buffer.
///
/// This is the registry ingestion path: cells become `0.0`/`1.0` and the
/// buffer's `updated` flag is set.
///
/// # Errors
///
/// Same failure modes as [`decode_bits`].
pub fn decode_bits_to_buffer(bytes: &[u8]) -> Result<SourceBuffer, CodecError> {
    let header = Header::read(bytes)?;
    header.check_payload(bytes, 1)?;
    let count = header.cell_count();
    let mut cells = Vec::new();
    cells.try_reserve_exact(count)?;
    for i in 0..count {
        let bit = (bytes[CELL_POS + i / 8] >> (7 - i % 8)) & 1;
        cells.push(f32::from(bit));
    }
    Ok(SourceBuffer::from_decoded(
        header.rows,
        header.cols,
        header.seq,
        header.stamp,
        cells,
    ))
}

/// Encodes a grid at 4 bits per cell.
///
/// Each cell symbol's value is taken modulo 16 before packing, so values
/// above 15 silently wrap, a known precision limit of nibble mode. The size
/// marker byte at offset 0 holds the total frame length truncated to a byte.
///
/// # Errors
///
/// Returns [`CodecError::Alloc`] if the frame cannot be allocated.
pub fn encode_nibbles(grid: &LogicalGrid) -> Result<Vec<u8>, CodecError> {
    let cells = grid.cells();
    let mut out = write_header(grid, cells.len().div_ceil(2))?;
    out[SIZE_POS] = out.len() as u8;
    for (i, &cell) in cells.iter().enumerate() {
        let value = (symbol_value(cell) & 0xF) as u8;
        let shift = if i % 2 == 0 { 4 } else { 0 };
        out[CELL_POS + i / 2] |= value << shift;
    }
    Ok(out)
}

/// Decodes a nibble-mode frame into a grid of hex symbols.
///
/// # Errors
///
/// Fails on a truncated header, zero dimensions, a payload shorter than
/// `rows * cols` nibbles, or allocation failure.
pub fn decode_nibbles(bytes: &[u8]) -> Result<LogicalGrid, CodecError> {
    let header = Header::read(bytes)?;
    header.check_payload(bytes, 4)?;
    let count = header.cell_count();
    let mut cells = Vec::new();
    cells.try_reserve_exact(count)?;
    for i in 0..count {
        let byte = bytes[CELL_POS + i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0xF };
        cells.push(nibble_to_ascii(u32::from(nibble)));
    }
    let mut grid = LogicalGrid::from_parts(header.rows, header.cols, cells);
    grid.set_seq(header.seq);
    grid.set_stamp(header.stamp);
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{ALIVE, DEAD};

    fn sample_grid(rows: usize, cols: usize) -> LogicalGrid {
        let cells: Vec<u8> = (0..rows * cols)
            .map(|i| if i % 3 == 0 { ALIVE } else { DEAD })
            .collect();
        let mut grid = LogicalGrid::from_cells(rows, cols, cells).unwrap();
        grid.set_seq(77);
        grid.set_stamp(Timestamp {
            secs: 1_700_000_000,
            micros: 123_456,
        });
        grid
    }

    #[test]
    fn bit_roundtrip_exact() {
        // 2x4 = 8 cells, a whole byte.
        let grid = sample_grid(2, 4);
        let frame = encode_bits(&grid).unwrap();
        let decoded = decode_bits(&frame).unwrap();
        assert_eq!(decoded, grid);
    }

    #[test]
    fn bit_roundtrip_partial_final_byte() {
        // 3x3 = 9 cells leaves 7 pad bits in the final byte.
        let grid = sample_grid(3, 3);
        let frame = encode_bits(&grid).unwrap();
        assert_eq!(frame.len(), HEADER_LEN + 2);
        let decoded = decode_bits(&frame).unwrap();
        assert_eq!(decoded.cells(), grid.cells());
        assert_eq!(decoded.seq(), grid.seq());
        assert_eq!(decoded.stamp(), grid.stamp());
    }

    #[test]
    fn bits_pack_msb_first() {
        let grid = LogicalGrid::from_cells(
            1,
            8,
            vec![ALIVE, DEAD, DEAD, DEAD, DEAD, DEAD, DEAD, ALIVE],
        )
        .unwrap();
        let frame = encode_bits(&grid).unwrap();
        // Cell 0 lands in the most significant bit.
        assert_eq!(frame[CELL_POS], 0b1000_0001);
    }

    #[test]
    fn sequence_number_is_native_order() {
        let mut grid = sample_grid(1, 1);
        grid.set_seq(0xDEAD_BEEF);
        let frame = encode_bits(&grid).unwrap();
        assert_eq!(frame[SN_POS..ROW_POS], 0xDEAD_BEEFu32.to_ne_bytes());
    }

    #[test]
    fn truncated_header_rejected() {
        let err = decode_bits(&[0u8; HEADER_LEN - 1]).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedHeader { len } if len == HEADER_LEN - 1));
    }

    #[test]
    fn short_payload_rejected() {
        let grid = sample_grid(16, 16);
        let frame = encode_bits(&grid).unwrap();
        let err = decode_bits(&frame[..frame.len() - 1]).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedPayload { .. }));
    }

    #[test]
    fn zero_dimension_rejected() {
        let grid = sample_grid(1, 1);
        let mut frame = encode_bits(&grid).unwrap();
        frame[ROW_POS] = 0;
        let err = decode_bits(&frame).unwrap_err();
        assert!(matches!(err, CodecError::Grid(GridError::ZeroDimension)));
    }

    #[test]
    fn nibble_roundtrip_all_values() {
        let cells: Vec<u8> = (0..16).map(nibble_to_ascii).collect();
        let mut grid = LogicalGrid::from_cells(4, 4, cells.clone()).unwrap();
        grid.set_seq(3);
        let frame = encode_nibbles(&grid).unwrap();
        let decoded = decode_nibbles(&frame).unwrap();
        assert_eq!(decoded.cells(), cells.as_slice());
        assert_eq!(decoded.seq(), 3);
    }

    #[test]
    fn nibble_values_wrap_mod_16() {
        // 'G' denotes 16, which wraps to 0 on the wire.
        let grid = LogicalGrid::from_cells(1, 2, vec![b'G', b'Q']).unwrap();
        let frame = encode_nibbles(&grid).unwrap();
        let decoded = decode_nibbles(&frame).unwrap();
        assert_eq!(decoded.cells(), &[b'0', b'A']);
    }

    #[test]
    fn nibble_odd_cell_count_pads_final_byte() {
        let cells = vec![b'1', b'2', b'3'];
        let grid = LogicalGrid::from_cells(1, 3, cells.clone()).unwrap();
        let frame = encode_nibbles(&grid).unwrap();
        assert_eq!(frame.len(), HEADER_LEN + 2);
        assert_eq!(frame[SIZE_POS], (HEADER_LEN + 2) as u8);
        let decoded = decode_nibbles(&frame).unwrap();
        assert_eq!(decoded.cells(), cells.as_slice());
    }

    #[test]
    fn buffer_decode_yields_floats_and_updated_flag() {
        let grid =
            LogicalGrid::from_cells(2, 2, vec![ALIVE, DEAD, DEAD, ALIVE]).unwrap();
        let frame = encode_bits(&grid).unwrap();
        let buffer = decode_bits_to_buffer(&frame).unwrap();
        assert_eq!(buffer.rows(), 2);
        assert_eq!(buffer.cols(), 2);
        assert!(buffer.updated());
        assert_eq!(buffer.cells(), &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn max_dimension_roundtrip() {
        let grid = sample_grid(255, 255);
        let frame = encode_bits(&grid).unwrap();
        let decoded = decode_bits(&frame).unwrap();
        assert_eq!(decoded, grid);
    }
}
