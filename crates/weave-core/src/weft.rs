// SPDX-License-Identifier: Apache-2.0
//! Per-site upper-bound vectors: causal cuts over the weave.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ident::{AtomId, SiteId, YarnIndex};

/// A mapping `SiteId -> YarnIndex` recording, for each site the weft has
/// heard from, the highest yarn index known.
///
/// Wefts form a join-semilattice under pointwise max; a site absent from the
/// map is not the same as a site present with index 0 — it means "no atoms
/// from that site have been observed at all."
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Weft {
    entries: BTreeMap<SiteId, YarnIndex>,
}

impl Weft {
    /// An empty weft (no sites observed).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The highest yarn index known for `site`, or `None` if the weft has
    /// never heard from it.
    #[must_use]
    pub fn get(&self, site: SiteId) -> Option<YarnIndex> {
        self.entries.get(&site).copied()
    }

    /// Raises `weft[site]` to `max(weft[site], index)`, inserting the site if
    /// absent.
    pub fn update_index(&mut self, site: SiteId, index: YarnIndex) {
        self.entries
            .entry(site)
            .and_modify(|existing| {
                if index > *existing {
                    *existing = index;
                }
            })
            .or_insert(index);
    }

    /// Shorthand for `update_index(atom_id.site, atom_id.index)`. A no-op for
    /// [`AtomId::NULL`].
    pub fn update(&mut self, atom_id: AtomId) {
        if !atom_id.is_null() {
            self.update_index(atom_id.site, atom_id.index);
        }
    }

    /// `true` iff this weft includes `atom_id`. [`AtomId::NULL`] is always
    /// vacuously included.
    #[must_use]
    pub fn includes(&self, atom_id: AtomId) -> bool {
        if atom_id.is_null() {
            return true;
        }
        self.get(atom_id.site)
            .is_some_and(|known| known >= atom_id.index)
    }

    /// Iterates `(site, index)` pairs in site order.
    pub fn iter(&self) -> impl Iterator<Item = (SiteId, YarnIndex)> + '_ {
        self.entries.iter().map(|(s, i)| (*s, *i))
    }

    /// Pointwise `self <= other`: every site this weft knows about is known
    /// at least as far by `other`.
    #[must_use]
    pub fn le(&self, other: &Weft) -> bool {
        self.entries
            .iter()
            .all(|(site, index)| other.get(*site).is_some_and(|o| o >= *index))
    }

    /// Pointwise `self >= other`.
    #[must_use]
    pub fn ge(&self, other: &Weft) -> bool {
        other.le(self)
    }

    /// Pointwise join (site-wise max) of `self` and `other`.
    #[must_use]
    pub fn joined(&self, other: &Weft) -> Weft {
        let mut out = self.clone();
        for (site, index) in other.iter() {
            out.update_index(site, index);
        }
        out
    }

    /// Lexicographic comparison over sites in ascending site-id order,
    /// treating an absent site as index `0`. This total order is used only
    /// as a deterministic tiebreak when two wefts are not pointwise
    /// comparable (spec §4.1) — it carries no causal meaning on its own.
    #[must_use]
    pub fn lexicographically_less(&self, other: &Weft) -> bool {
        let mut sites: Vec<SiteId> = self
            .entries
            .keys()
            .chain(other.entries.keys())
            .copied()
            .collect();
        sites.sort_unstable();
        sites.dedup();
        for site in sites {
            let a = self.get(site).unwrap_or(0);
            let b = other.get(site).unwrap_or(0);
            if a != b {
                return a < b;
            }
        }
        false
    }

    /// `true` iff `self` is "more aware" than `other`: a pointwise superset
    /// when the two are comparable, otherwise the deterministic
    /// lexicographic tiebreak. Used to compute the `a1MoreAwareThanA2`
    /// argument to [`crate::atom_sibling_order`] and the `F` case of the
    /// merge engine.
    #[must_use]
    pub fn more_aware_than(&self, other: &Weft) -> bool {
        if self == other {
            return false;
        }
        if self.ge(other) {
            return true;
        }
        if other.ge(self) {
            return false;
        }
        other.lexicographically_less(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_site_and_index_zero_are_distinct() {
        let mut w = Weft::new();
        assert_eq!(w.get(0), None);
        w.update_index(0, 0);
        assert_eq!(w.get(0), Some(0));
    }

    #[test]
    fn join_is_pointwise_max() {
        let mut a = Weft::new();
        a.update_index(1, 3);
        a.update_index(2, 1);
        let mut b = Weft::new();
        b.update_index(1, 1);
        b.update_index(3, 5);

        let joined = a.joined(&b);
        assert_eq!(joined.get(1), Some(3));
        assert_eq!(joined.get(2), Some(1));
        assert_eq!(joined.get(3), Some(5));
    }

    #[test]
    fn more_aware_than_falls_back_to_lexicographic_tiebreak() {
        let mut a = Weft::new();
        a.update_index(1, 1);
        let mut b = Weft::new();
        b.update_index(2, 1);
        // Neither dominates the other pointwise.
        assert!(!a.ge(&b));
        assert!(!b.ge(&a));
        assert!(a.more_aware_than(&b));
        assert!(!b.more_aware_than(&a));
    }
}
