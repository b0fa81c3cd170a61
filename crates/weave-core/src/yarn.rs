// SPDX-License-Identifier: Apache-2.0
//! Per-site contiguous arrays of atoms, indexed by yarn index in O(1).
//!
//! Internal state is a single flat vector concatenating every site's atoms,
//! plus a map from site to the `[lo, hi)` half-open slice of that vector
//! holding the site's yarn (spec §4.2). This is a parallel, duplicate
//! storage of the same atoms held by [`crate::Weave`]'s canonical order —
//! see the crate-level "arenas, not pointers" note.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::atom::Atom;
use crate::ident::{AtomId, SiteId};

#[derive(Clone, Debug, Default)]
pub(crate) struct YarnCache<V> {
    yarns: Vec<Atom<V>>,
    ranges: BTreeMap<SiteId, Range<usize>>,
}

impl<V: Clone> YarnCache<V> {
    pub(crate) fn new() -> Self {
        Self {
            yarns: Vec::new(),
            ranges: BTreeMap::new(),
        }
    }

    /// Total number of atoms cached across all yarns.
    pub(crate) fn len(&self) -> usize {
        self.yarns.len()
    }

    /// Flat index into the underlying vector for `id`, or `None` if `id` is
    /// null or out of range for its site.
    pub(crate) fn atom_yarns_index(&self, id: AtomId) -> Option<usize> {
        if id.is_null() {
            return None;
        }
        let range = self.ranges.get(&id.site)?;
        let offset = id.index as usize;
        if offset >= range.len() {
            return None;
        }
        Some(range.start + offset)
    }

    pub(crate) fn atom_for_id(&self, id: AtomId) -> Option<&Atom<V>> {
        self.atom_yarns_index(id).map(|i| &self.yarns[i])
    }

    /// A site's atoms in increasing yarn-index order, or an empty slice if
    /// the site is unknown.
    pub(crate) fn yarn(&self, site: SiteId) -> &[Atom<V>] {
        self.ranges
            .get(&site)
            .map_or(&[][..], |r| &self.yarns[r.clone()])
    }

    pub(crate) fn last_site_atom_yarns_index(&self, site: SiteId) -> Option<usize> {
        let range = self.ranges.get(&site)?;
        if range.is_empty() {
            None
        } else {
            Some(range.end - 1)
        }
    }

    /// Sites known to this cache, in ascending order.
    pub(crate) fn sites(&self) -> impl Iterator<Item = SiteId> + '_ {
        self.ranges.keys().copied()
    }

    /// Appends `atom` to its site's yarn (the owning site is always
    /// extended at its tail, since atoms are only ever created with the
    /// next yarn index for their site). Maintains every other site's range
    /// by shifting ranges whose start lies at or past the insertion point.
    pub(crate) fn push(&mut self, atom: Atom<V>) {
        let site = atom.id.site;
        match self.ranges.get(&site).cloned() {
            Some(range) => {
                let insert_at = range.end;
                self.yarns.insert(insert_at, atom);
                for (other_site, other_range) in &mut self.ranges {
                    if *other_site == site {
                        continue;
                    }
                    if other_range.start >= insert_at {
                        other_range.start += 1;
                        other_range.end += 1;
                    }
                }
                if let Some(r) = self.ranges.get_mut(&site) {
                    r.end += 1;
                }
            }
            None => {
                let start = self.yarns.len();
                self.yarns.push(atom);
                self.ranges.insert(site, start..start + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AtomType;

    fn atom(site: SiteId, index: u32) -> Atom<()> {
        Atom {
            id: AtomId { site, index },
            cause: AtomId::NULL,
            clock: 0,
            value: (),
            reference: AtomId::NULL,
            ty: AtomType::None,
        }
    }

    #[test]
    fn interleaved_sites_keep_independent_contiguous_ranges() {
        let mut cache: YarnCache<()> = YarnCache::new();
        cache.push(atom(1, 0));
        cache.push(atom(2, 0));
        cache.push(atom(1, 1));
        cache.push(atom(2, 1));

        assert_eq!(cache.yarn(1).iter().map(|a| a.id.index).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(cache.yarn(2).iter().map(|a| a.id.index).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(cache.atom_yarns_index(AtomId { site: 2, index: 1 }), Some(3));
    }
}
