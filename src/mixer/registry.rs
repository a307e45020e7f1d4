//! Registry of per-source buffers, keyed by an opaque source identity.
//!
//! The identity is whatever the caller supplies. The reference system used
//! the sender's network address, which conflates distinct logical sources
//! behind one address. The registry takes any `Eq + Hash` key so a caller
//! can choose a finer-grained identity without touching the core contract.

use std::collections::HashMap;
use std::hash::Hash;

use crate::mixer::SourceBuffer;
use crate::trace;

/// How sequence numbers are compared when deciding whether an incoming
/// snapshot is newer than the held one.
///
/// The protocol defines no rollover behavior: under [`Strict`] comparison a
/// source whose counter wraps past `u32::MAX` has all further updates
/// rejected until its entry is removed and recreated. [`WrapAware`] is an
/// explicit opt-in alternative, never a silent default.
///
/// [`Strict`]: SequencePolicy::Strict
/// [`WrapAware`]: SequencePolicy::WrapAware
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SequencePolicy {
    /// Accept only a plainly greater sequence number.
    #[default]
    Strict,
    /// Accept when the signed difference is positive, so a counter that
    /// wraps around zero keeps being accepted (half-space comparison).
    WrapAware,
}

impl SequencePolicy {
    /// Whether `offered` should replace `held`.
    #[inline]
    #[must_use]
    pub fn newer(self, offered: u32, held: u32) -> bool {
        match self {
            Self::Strict => offered > held,
            Self::WrapAware => (offered.wrapping_sub(held) as i32) > 0,
        }
    }
}

/// Result of offering a decoded buffer to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// First snapshot from a new identity; entry created.
    Inserted,
    /// Strictly newer snapshot; the held buffer was replaced.
    Replaced,
    /// Sequence number not newer; the offered buffer was discarded and the
    /// held one is untouched.
    Stale { held: u32, offered: u32 },
}

/// Associative collection from source identity to that source's latest
/// accepted buffer.
///
/// All mutation is expected to be serialized by a single logical writer;
/// there is no interior locking.
#[derive(Debug)]
pub struct SourceRegistry<I> {
    sources: HashMap<I, SourceBuffer>,
    policy: SequencePolicy,
}

impl<I: Eq + Hash> SourceRegistry<I> {
    /// Empty registry with the default [`SequencePolicy::Strict`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(SequencePolicy::Strict)
    }

    /// Empty registry with an explicit sequence comparison policy.
    #[must_use]
    pub fn with_policy(policy: SequencePolicy) -> Self {
        Self {
            sources: HashMap::new(),
            policy,
        }
    }

    /// Offers a freshly decoded buffer for `identity`.
    ///
    /// Unknown identities are inserted. Known identities are replaced only
    /// when the offered sequence number is newer under the registry's
    /// policy; otherwise the offer is dropped and the held buffer is left
    /// untouched. A stale offer is a diagnostic, not an error: one
    /// misbehaving source must not disrupt the others.
    pub fn update(&mut self, identity: I, buffer: SourceBuffer) -> UpdateOutcome {
        use std::collections::hash_map::Entry;

        match self.sources.entry(identity) {
            Entry::Vacant(entry) => {
                entry.insert(buffer);
                UpdateOutcome::Inserted
            }
            Entry::Occupied(mut entry) => {
                let held = entry.get().seq();
                let offered = buffer.seq();
                if self.policy.newer(offered, held) {
                    entry.insert(buffer);
                    UpdateOutcome::Replaced
                } else {
                    trace::debug!(held, offered, "discarding stale update");
                    UpdateOutcome::Stale { held, offered }
                }
            }
        }
    }

    /// Removes a departed source. Returns `false` (not an error) when the
    /// identity is unknown.
    pub fn remove(&mut self, identity: &I) -> bool {
        self.sources.remove(identity).is_some()
    }

    /// Looks up the held buffer for `identity`, without mutation.
    #[must_use]
    pub fn find(&self, identity: &I) -> Option<&SourceBuffer> {
        self.sources.get(identity)
    }

    /// Whether any sources are registered. Callers use this to decide
    /// whether to keep running the mixing loop.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Iterates over all held buffers.
    pub fn buffers(&self) -> impl Iterator<Item = &SourceBuffer> {
        self.sources.values()
    }

    pub(crate) fn buffers_mut(&mut self) -> impl Iterator<Item = &mut SourceBuffer> {
        self.sources.values_mut()
    }
}

impl<I: Eq + Hash> Default for SourceRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}
