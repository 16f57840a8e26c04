//! Per-kind monotonic id sequences.

use crate::id::{EntityKind, SequencedId};

/// Hands out fresh ids, one independent sequence per [`EntityKind`].
///
/// Ids start at 1 (0 is reserved as the on-disk "none" marker) and are never
/// reused, even after the record holding them is deleted. Secondary-key
/// uniqueness (usernames, item names) is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRegistry {
    next: [u64; 4],
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self { next: [1; 4] }
    }

    /// Mint the next id of type `I`.
    pub fn next_id<I: SequencedId>(&mut self) -> I {
        I::from_raw(self.next_raw(I::KIND))
    }

    /// Mint the next raw id for `kind`. Never fails.
    pub fn next_raw(&mut self, kind: EntityKind) -> u64 {
        let slot = &mut self.next[kind.index()];
        let id = *slot;
        *slot = slot.saturating_add(1);
        id
    }

    /// The id the next call to [`next_raw`](Self::next_raw) would return.
    pub fn peek(&self, kind: EntityKind) -> u64 {
        self.next[kind.index()]
    }

    /// Re-seed `kind` after a bulk load so the sequence continues at `max_loaded + 1`.
    pub fn reseed(&mut self, kind: EntityKind, max_loaded: Option<u64>) {
        self.next[kind.index()] = max_loaded.map_or(1, |max| max.saturating_add(1));
    }

    /// Make sure a future mint for `kind` cannot hand out `raw` again.
    pub fn observe(&mut self, kind: EntityKind, raw: u64) {
        let slot = &mut self.next[kind.index()];
        if raw >= *slot {
            *slot = raw.saturating_add(1);
        }
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
