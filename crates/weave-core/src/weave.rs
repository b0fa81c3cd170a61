// SPDX-License-Identifier: Apache-2.0
//! The weave itself: the canonical linearization of all atoms, and the
//! three single-atom mutators that grow it.

use crate::atom::{Atom, AtomType};
use crate::error::PlacementError;
use crate::ident::{unparented_atom_order, AtomId, Clock, SiteId, YarnIndex};
use crate::weft::Weft;
use crate::yarn::YarnCache;

/// The canonical linearization of all atoms: a convergent replicated
/// document.
///
/// `atoms` holds the weave order itself — tree region `[0, tree_len)`
/// followed by the unparented region `[tree_len, len)`. `yarns` and `weft`
/// are the two auxiliary views described in spec §2: a per-site O(1) index,
/// and a per-site causal-frontier summary. All three are updated together
/// by every mutator; none is ever allowed to drift from the others between
/// public calls (spec §5: readers never observe an intermediate state).
#[derive(Clone, Debug)]
pub struct Weave<V> {
    pub(crate) owner: SiteId,
    pub(crate) atoms: Vec<Atom<V>>,
    pub(crate) tree_len: usize,
    pub(crate) yarns: YarnCache<V>,
    pub(crate) weft: Weft,
}

impl<V: Clone + Default> Weave<V> {
    /// Creates a weave owned by `owner`, seeded with the `start` and `end`
    /// sentinel atoms (spec §6 `new(owner)`).
    #[must_use]
    pub fn new(owner: SiteId) -> Self {
        let mut weave = Self {
            owner,
            atoms: Vec::new(),
            tree_len: 0,
            yarns: YarnCache::new(),
            weft: Weft::new(),
        };
        let start = Atom {
            id: AtomId::START,
            cause: AtomId::START,
            clock: crate::ident::START_CLOCK,
            value: V::default(),
            reference: AtomId::NULL,
            ty: AtomType::Start,
        };
        let end = Atom {
            id: AtomId::END,
            cause: AtomId::NULL,
            clock: crate::ident::END_CLOCK,
            value: V::default(),
            reference: AtomId::NULL,
            ty: AtomType::End,
        };
        weave.atoms.push(start.clone());
        weave.yarns.push(start);
        weave.tree_len = 1;
        weave.atoms.push(end.clone());
        weave.yarns.push(end);
        weave.weft.update(AtomId::END);
        weave
    }

    /// Rebuilds a weave from a serialized `{owner, atoms}` pair, in weave
    /// order verbatim. Rebuilds the yarn cache and weft; does **not**
    /// validate (spec §6) — call [`Weave::validate`] explicitly if the
    /// source is untrusted.
    #[must_use]
    pub fn from_serialized(owner: SiteId, atoms: Vec<Atom<V>>) -> Self {
        let mut weave = Self {
            owner,
            atoms: Vec::with_capacity(atoms.len()),
            tree_len: 0,
            yarns: YarnCache::new(),
            weft: Weft::new(),
        };
        for atom in atoms {
            if !atom.ty.unparented() {
                weave.tree_len += 1;
            }
            weave.weft.update(atom.id);
            weave.yarns.push(atom.clone());
            weave.atoms.push(atom);
        }
        weave
    }

    /// The site that owns this replica.
    #[must_use]
    pub const fn owner(&self) -> SiteId {
        self.owner
    }

    /// The weave in canonical order: tree region followed by unparented
    /// region.
    #[must_use]
    pub fn weave(&self) -> &[Atom<V>] {
        &self.atoms
    }

    /// The weave index at which the unparented region begins (`K` in spec
    /// §3).
    #[must_use]
    pub const fn tree_len(&self) -> usize {
        self.tree_len
    }

    /// Total number of bytes occupied by the atom storage (weave vector plus
    /// yarn cache), for capacity/telemetry purposes.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        let atom_size = std::mem::size_of::<Atom<V>>();
        (self.atoms.len() + self.yarns.len()) * atom_size
    }

    /// Current weft: the highest yarn index known for every site this
    /// replica has heard from.
    #[must_use]
    pub fn complete_weft(&self) -> Weft {
        self.weft.clone()
    }

    /// `true` iff `self`'s weft pointwise dominates `other`'s: `self` has
    /// seen everything `other` has.
    #[must_use]
    pub fn superset(&self, other: &Weave<V>) -> bool {
        other.weft.le(&self.weft)
    }

    /// Atom record for `id`, via the O(1) yarn cache.
    #[must_use]
    pub fn atom_for_id(&self, id: AtomId) -> Option<&Atom<V>> {
        self.yarns.atom_for_id(id)
    }

    /// O(1) position of `id` within its per-site yarn cache slice (not its
    /// weave index — see [`Weave::atom_weave_index`] for that).
    #[must_use]
    pub fn atom_yarns_index(&self, id: AtomId) -> Option<usize> {
        self.yarns.atom_yarns_index(id)
    }

    /// `id`'s position in the canonical weave order. Linear scan (spec §9
    /// open question 3: an auxiliary `AtomId -> usize` index would make
    /// this O(1), at the cost of maintaining it across every mutation and
    /// merge; not done here).
    #[must_use]
    pub fn atom_weave_index(&self, id: AtomId) -> Option<usize> {
        if id.is_null() {
            return None;
        }
        self.atoms.iter().position(|a| a.id == id)
    }

    /// The last yarn-cache position used by `site`, or `None` if the site
    /// has never produced an atom.
    #[must_use]
    pub fn last_site_atom_yarns_index(&self, site: SiteId) -> Option<usize> {
        self.yarns.last_site_atom_yarns_index(site)
    }

    /// `site`'s atoms in increasing yarn-index order.
    #[must_use]
    pub fn yarn(&self, site: SiteId) -> &[Atom<V>] {
        self.yarns.yarn(site)
    }

    fn last_atom_of(&self, site: SiteId) -> AtomId {
        self.yarns.yarn(site).last().map_or(AtomId::NULL, |a| a.id)
    }

    fn next_index_for(&self, site: SiteId) -> YarnIndex {
        self.weft.get(site).map_or(0, |i| i + 1)
    }

    /// Appends a new content atom under `cause`.
    ///
    /// First synthesizes an `addCommit(owner, s, clock)` for every distinct
    /// sibling site `s` of `cause` (excluding the owner itself) currently
    /// visible in the weave — this is what makes the new atom's awareness
    /// dominate any known sibling yarn, so independent inserts under the
    /// same parent converge deterministically once merged (spec §4.3). This
    /// may synthesize a commit the owner was already aware of; that is a
    /// space cost, not a correctness issue (spec §9 open question 1) and is
    /// not deduplicated here.
    ///
    /// Returns `None` if `cause` cannot be located or is childless.
    pub fn add_atom(&mut self, value: V, cause: AtomId, clock: Clock) -> Option<AtomId> {
        let sibling_sites: std::collections::BTreeSet<SiteId> = self
            .atoms
            .iter()
            .filter(|a| a.cause == cause && a.id.site != self.owner)
            .map(|a| a.id.site)
            .collect();
        for site in sibling_sites {
            let _ = self.add_commit(self.owner, site, clock);
        }

        let id = AtomId {
            site: self.owner,
            index: self.next_index_for(self.owner),
        };
        let atom = Atom {
            id,
            cause,
            clock,
            value,
            reference: AtomId::NULL,
            ty: AtomType::None,
        };
        self.splice_atom(atom).ok()
    }

    /// Tombstones `target` by appending a `delete` atom whose cause is
    /// `target`. Fails if `target` is not a live (`none`-typed) atom.
    pub fn delete_atom(&mut self, target: AtomId, clock: Clock) -> Option<AtomId> {
        let targeted = self.atom_for_id(target)?;
        if targeted.ty != AtomType::None {
            return None;
        }
        let id = AtomId {
            site: self.owner,
            index: self.next_index_for(self.owner),
        };
        let atom = Atom {
            id,
            cause: target,
            clock,
            value: V::default(),
            reference: AtomId::NULL,
            ty: AtomType::Delete,
        };
        self.splice_atom(atom).ok()
    }

    /// Emits an unparented `commit` atom from `from_site` referencing
    /// `to_site`'s current yarn tail. A no-op (`None`) when `from_site ==
    /// to_site`.
    pub fn add_commit(&mut self, from_site: SiteId, to_site: SiteId, clock: Clock) -> Option<AtomId> {
        if from_site == to_site {
            return None;
        }
        let reference = self.last_atom_of(to_site);
        let id = AtomId {
            site: from_site,
            index: self.next_index_for(from_site),
        };
        let atom = Atom {
            id,
            cause: AtomId::NULL,
            clock,
            value: V::default(),
            reference,
            ty: AtomType::Commit,
        };
        self.splice_atom(atom).ok()
    }

    /// Places a freshly created atom into the weave, updating all three
    /// views (weave order, yarn cache, weft) together.
    ///
    /// For unparented atoms, the insertion point is found by a linear scan
    /// forward from the `end` atom until [`unparented_atom_order`] stops
    /// holding (spec §4.3). For tree atoms, the new atom becomes the
    /// firstmost child of its cause: sibling order is preserved without an
    /// extra comparison because a brand-new atom is always either
    /// higher-priority (a `delete`) or strictly more aware than any
    /// pre-existing sibling (it was just created after observing that
    /// sibling, possibly via the `addCommit` step in [`Weave::add_atom`]).
    fn splice_atom(&mut self, atom: Atom<V>) -> Result<AtomId, PlacementError> {
        let id = atom.id;
        if atom.ty.unparented() {
            if !atom.cause.is_null() {
                return Err(PlacementError::UnparentedAtomHasCause);
            }
            let mut pos = self.tree_len;
            while pos < self.atoms.len() && unparented_atom_order(self.atoms[pos].id, id) {
                pos += 1;
            }
            self.atoms.insert(pos, atom.clone());
        } else {
            let cause_idx = self
                .atom_weave_index(atom.cause)
                .ok_or(PlacementError::CauseNotFound(atom.cause))?;
            if self.atoms[cause_idx].ty.childless() {
                return Err(PlacementError::CauseIsChildless(atom.cause));
            }
            self.atoms.insert(cause_idx + 1, atom.clone());
            self.tree_len += 1;
        }
        self.yarns.push(atom);
        self.weft.update(id);
        Ok(id)
    }

    /// Rewrites every site identifier in the weave through `map`, including
    /// atom ids, causes, references, and the keys of the weft and yarn
    /// cache. Does not re-sort the weave — the caller must guarantee `map`
    /// preserves canonical order, or re-run [`Weave::validate`] afterward
    /// (spec §4.9).
    pub fn remap_indices<F>(&mut self, map: F)
    where
        F: Fn(SiteId) -> SiteId,
    {
        let remap_id = |id: AtomId| -> AtomId {
            if id.is_null() {
                id
            } else {
                AtomId {
                    site: map(id.site),
                    index: id.index,
                }
            }
        };
        self.owner = map(self.owner);
        for atom in &mut self.atoms {
            atom.id = remap_id(atom.id);
            atom.cause = remap_id(atom.cause);
            atom.reference = remap_id(atom.reference);
        }
        let remapped_weft = {
            let mut w = Weft::new();
            for (site, index) in self.weft.iter() {
                w.update_index(map(site), index);
            }
            w
        };
        self.weft = remapped_weft;
        let mut rebuilt = YarnCache::new();
        for atom in &self.atoms {
            rebuilt.push(atom.clone());
        }
        self.yarns = rebuilt;
    }
}

/// The canonical order between two sibling atoms (atoms sharing a `cause`).
///
/// `a1_more_aware_than_a2` should come from [`crate::weft::Weft::more_aware_than`]
/// applied to the two atoms' awareness wefts. A `priority` atom (currently
/// only `delete`) always sorts before a non-priority sibling, regardless of
/// awareness; otherwise the more-aware atom sorts first. Two distinct atoms
/// that are equal in both priority and awareness violate spec invariant I4
/// and are caught by [`Weave::validate`], not here.
#[must_use]
pub fn atom_sibling_order<V>(a1: &Atom<V>, a2: &Atom<V>, a1_more_aware_than_a2: bool) -> bool {
    if a1.id == a2.id {
        return false;
    }
    if a1.ty.priority() != a2.ty.priority() {
        return a1.ty.priority();
    }
    a1_more_aware_than_a2
}
