//! The mixer engine: per-source buffers, the source registry, and the merge.
//!
//! One logical actor owns a [`SourceRegistry`] and serializes every update,
//! removal, and merge against it; nothing in here locks. The accept/reject
//! decision in [`SourceRegistry::update`] is a read-modify-write, so callers
//! wanting concurrent ingestion must wrap the registry in one mutual
//! exclusion boundary covering the whole sequence.

pub mod buffer;
pub mod merge;
pub mod registry;

pub use buffer::SourceBuffer;
pub use merge::{MergeError, Mixer};
pub use registry::{SequencePolicy, SourceRegistry, UpdateOutcome};
