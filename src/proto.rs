//! Classification of inbound datagrams.
//!
//! The transport recognizes two literal control strings alongside packed
//! grid frames: `"end"` signals a source's departure, `"tick"` signals a
//! merge-cycle boundary. Anything else is handed to the codec as a frame.
//! Trailing NUL bytes are tolerated so C-string senders that ship the
//! terminator classify correctly.
//!
//! A frame whose leading bytes spell a control string would be
//! misclassified; the reference protocol shares the hazard and real frames
//! start with a 23-byte binary header, so it is accepted.

/// Departure control payload.
pub const DEPART: &[u8] = b"end";

/// Merge-cycle boundary control payload.
pub const TICK: &[u8] = b"tick";

/// One classified inbound datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datagram<'a> {
    /// The sender is departing; its registry entry should be removed.
    Depart,
    /// A merge cycle should run now.
    Tick,
    /// A packed grid frame for the codec.
    Frame(&'a [u8]),
}

impl<'a> Datagram<'a> {
    /// Classifies a raw datagram payload.
    #[must_use]
    pub fn classify(payload: &'a [u8]) -> Self {
        let trimmed = trim_nul(payload);
        if trimmed == DEPART {
            Self::Depart
        } else if trimmed == TICK {
            Self::Tick
        } else {
            Self::Frame(payload)
        }
    }
}

fn trim_nul(payload: &[u8]) -> &[u8] {
    let end = payload
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);
    &payload[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_strings_classify() {
        assert_eq!(Datagram::classify(b"end"), Datagram::Depart);
        assert_eq!(Datagram::classify(b"tick"), Datagram::Tick);
    }

    #[test]
    fn c_string_terminators_are_tolerated() {
        assert_eq!(Datagram::classify(b"end\0"), Datagram::Depart);
        assert_eq!(Datagram::classify(b"tick\0"), Datagram::Tick);
    }

    #[test]
    fn anything_else_is_a_frame() {
        let payload = [0u8; 32];
        assert_eq!(Datagram::classify(&payload), Datagram::Frame(&payload));
        assert_eq!(Datagram::classify(b"ending"), Datagram::Frame(b"ending"));
    }
}
