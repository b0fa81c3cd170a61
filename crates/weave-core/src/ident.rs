// SPDX-License-Identifier: Apache-2.0
//! Identifiers and reserved constants for the causal tree weave.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A replica identifier. Small, dense integers rather than UUIDs — mapping a
/// site-UUID to a `SiteId` is a collaborator's concern, out of scope here
/// (see the crate-level docs).
pub type SiteId = u32;

/// A per-site, zero-based, gapless sequence number within one site's yarn.
pub type YarnIndex = u32;

/// An informational Lamport-style hint carried on every atom. Not
/// authoritative for ordering — the weave never compares clocks to decide
/// placement.
pub type Clock = u64;

/// The reserved site that owns the `start` and `end` sentinel atoms.
pub const CONTROL_SITE: SiteId = 0;

/// Sentinel site used by [`AtomId::NULL`]. Never a valid owner.
pub const INVALID_SITE: SiteId = SiteId::MAX;

/// Sentinel index used by [`AtomId::NULL`].
pub const INVALID_INDEX: YarnIndex = YarnIndex::MAX;

/// Clock value stamped on the `start` atom.
pub const START_CLOCK: Clock = 0;

/// Clock value stamped on the `end` atom.
pub const END_CLOCK: Clock = 1;

/// Unique identifier of an atom: the site that created it, and that site's
/// sequence number for it.
///
/// `AtomId` orders lexicographically by `(site, index)` — this is exactly
/// the canonical order of the unparented region (spec §4.4) and the
/// fast-forward comparisons of the merge engine, so the derived `Ord` is
/// relied upon rather than re-implemented.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AtomId {
    /// Owning site.
    pub site: SiteId,
    /// Sequence number within the owning site's yarn.
    pub index: YarnIndex,
}

impl AtomId {
    /// The absent/null atom reference: no site, no index. [`Weft::includes`]
    /// treats this as vacuously included (spec §4.1).
    pub const NULL: AtomId = AtomId {
        site: INVALID_SITE,
        index: INVALID_INDEX,
    };

    /// Identifier of the `start` atom: `(ControlSite, 0)`.
    pub const START: AtomId = AtomId {
        site: CONTROL_SITE,
        index: 0,
    };

    /// Identifier of the `end` atom: `(ControlSite, 1)`.
    pub const END: AtomId = AtomId {
        site: CONTROL_SITE,
        index: 1,
    };

    /// Returns `true` for [`AtomId::NULL`].
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.site == INVALID_SITE && self.index == INVALID_INDEX
    }
}

impl std::fmt::Display for AtomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "(null)")
        } else {
            write!(f, "({}, {})", self.site, self.index)
        }
    }
}

/// Returns `true` if `a` precedes `b` in the canonical unparented order:
/// lexicographic on `(site, index)`.
///
/// This is a thin, named wrapper over `AtomId`'s derived `Ord` so call
/// sites read the way spec §4.4 states the rule, rather than a bare `<`.
#[must_use]
pub fn unparented_atom_order(a: AtomId, b: AtomId) -> bool {
    a < b
}
