//! Capture timestamps carried inside wire frames.

use std::time::{SystemTime, UNIX_EPOCH};

/// Number of bytes a [`Timestamp`] occupies on the wire.
pub const TIMESTAMP_LEN: usize = 16;

/// Wall-clock capture time of a grid snapshot: seconds + microseconds.
///
/// On the wire this is two native-endian `i64`s, mirroring a 64-bit
/// `struct timeval`, and it is echoed back verbatim by decoders. Peers of a
/// different word width or byte order will disagree on the layout; that is a
/// known portability hazard of the protocol, preserved for compatibility
/// rather than fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    /// Whole seconds since the Unix epoch.
    pub secs: i64,
    /// Microsecond remainder, `0..1_000_000`.
    pub micros: i64,
}

impl Timestamp {
    /// Timestamp of the current wall-clock time.
    ///
    /// Times before the Unix epoch collapse to zero.
    #[must_use]
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            secs: elapsed.as_secs() as i64,
            micros: i64::from(elapsed.subsec_micros()),
        }
    }

    /// Serializes into the 16-byte wire representation.
    #[inline]
    #[must_use]
    pub fn to_wire(self) -> [u8; TIMESTAMP_LEN] {
        let mut out = [0u8; TIMESTAMP_LEN];
        out[..8].copy_from_slice(&self.secs.to_ne_bytes());
        out[8..].copy_from_slice(&self.micros.to_ne_bytes());
        out
    }

    /// Deserializes from the 16-byte wire representation.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`TIMESTAMP_LEN`]; callers validate
    /// frame length first.
    #[inline]
    #[must_use]
    pub fn from_wire(bytes: &[u8]) -> Self {
        let mut secs = [0u8; 8];
        let mut micros = [0u8; 8];
        secs.copy_from_slice(&bytes[..8]);
        micros.copy_from_slice(&bytes[8..TIMESTAMP_LEN]);
        Self {
            secs: i64::from_ne_bytes(secs),
            micros: i64::from_ne_bytes(micros),
        }
    }
}
