//! Real-time boolean cell-grid distribution and mixing over UDP.
//!
//! Many independent sources each maintain a small grid of '0'/'1' cells and
//! periodically ship a packed snapshot to a central mixer over plain
//! datagrams. The mixer keeps one decoded buffer per source and, on every
//! timer tick, folds all buffers into a single composite grid. Sources that
//! go quiet fade out geometrically instead of vanishing.
//!
//! The transport is fire-and-forget: packets may be lost, duplicated, or
//! reordered, and nothing here retransmits. A per-source sequence guard
//! drops stale snapshots; everything else is tolerated.
//!
//! # Modules
//!
//! - [`grid`]: the logical grid of ASCII cell symbols.
//! - [`codec`]: the bit-/nibble-packed wire frame format.
//! - [`mixer`]: per-source buffer registry, aging policy, and the merge.
//! - [`proto`]: classification of inbound datagrams (frame vs. control).
//! - [`net`]: non-blocking UDP socket wrapper.

pub mod codec;
pub mod grid;
pub mod mixer;
pub mod net;
pub mod proto;
pub mod time;

pub(crate) mod trace;

pub use trace::init_tracing;
