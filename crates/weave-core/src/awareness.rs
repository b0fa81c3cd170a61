// SPDX-License-Identifier: Apache-2.0
//! Awareness: the transitive causal-dependency weft of an atom, and the
//! contiguous weave ranges ("causal blocks") it roots.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::ident::AtomId;
use crate::weave::Weave;
use crate::weft::Weft;

impl<V: Clone + Default> Weave<V> {
    /// The awareness weft of `id`: the join of `id`'s own position with the
    /// awareness wefts of its `cause` and `reference`, transitively.
    ///
    /// Computed by an iterative post-order walk (not recursion — causal
    /// chains in a long-lived document can be deep enough to blow a call
    /// stack) with full memoization, so repeated cause/reference fan-in is
    /// visited once. Returns `None` if `id` is not present in the weave.
    #[must_use]
    pub fn awareness_weft(&self, id: AtomId) -> Option<Weft> {
        self.atom_for_id(id)?;
        let memo = self.all_awareness();
        memo.get(&id).cloned()
    }

    /// Computes the awareness weft of every atom in the weave in a single
    /// pass, memoizing shared dependency chains. Used internally by
    /// [`Weave::awareness_weft`] and by validation, which both need every
    /// atom's awareness and would otherwise recompute shared ancestry
    /// once per atom (quadratic — see spec open question 4).
    pub(crate) fn all_awareness(&self) -> BTreeMap<AtomId, Weft> {
        let mut memo = BTreeMap::new();
        for atom in &self.atoms {
            if !memo.contains_key(&atom.id) {
                self.resolve_awareness(atom.id, &mut memo);
            }
        }
        memo
    }

    /// Iterative DFS filling `memo` with the awareness weft of `id` and
    /// every unresolved atom on its dependency chain.
    fn resolve_awareness(&self, id: AtomId, memo: &mut BTreeMap<AtomId, Weft>) {
        let mut stack = vec![id];
        while let Some(&current) = stack.last() {
            if memo.contains_key(&current) {
                stack.pop();
                continue;
            }
            let Some(atom) = self.atom_for_id(current) else {
                memo.insert(current, Weft::new());
                stack.pop();
                continue;
            };
            let deps = [atom.cause, atom.reference];
            let mut waiting = false;
            for dep in deps {
                if !dep.is_null() && !memo.contains_key(&dep) {
                    stack.push(dep);
                    waiting = true;
                }
            }
            if waiting {
                continue;
            }
            let mut aware = Weft::new();
            aware.update(current);
            for dep in deps {
                if let Some(dep_weft) = (!dep.is_null()).then(|| memo.get(&dep)).flatten() {
                    aware = aware.joined(dep_weft);
                }
            }
            memo.insert(current, aware);
            stack.pop();
        }
    }

    /// The contiguous weave range of atoms causally dependent on the tree
    /// atom at `weave_index`: `weave_index` itself, plus every following
    /// atom (up to the unparented boundary) whose awareness includes the
    /// root.
    ///
    /// `precomputed`, if given, is taken as the root's own awareness weft.
    /// A childless root (`delete`/`end`) always yields a single-element
    /// range (spec §4.6) regardless of `precomputed`, since no other atom
    /// may ever cause a childless one — this short-circuits without
    /// touching awareness at all. Otherwise, determining the *rest* of the
    /// block still requires every candidate atom's own awareness, not just
    /// the root's, so `precomputed` cannot replace the full pass — it only
    /// saves recomputing the root's own entry within it. The scan is
    /// bounded by `tree_len`, not the full weave length: [`Weft::includes`]
    /// treats [`AtomId::NULL`] as vacuously present, and every unparented
    /// atom's `cause` is `NULL`, so an unbounded scan would risk folding the
    /// unparented region into the block. Returns `None` for an out-of-tree
    /// index — unparented roots have no causal block.
    #[must_use]
    pub fn causal_block(&self, weave_index: usize, precomputed: Option<&Weft>) -> Option<Range<usize>> {
        if weave_index < self.tree_len && self.atoms[weave_index].ty.childless() {
            return Some(weave_index..weave_index + 1);
        }
        let mut awareness = self.all_awareness();
        if let Some(root_id) = self.atoms.get(weave_index).map(|a| a.id) {
            if let Some(root_weft) = precomputed {
                awareness.insert(root_id, root_weft.clone());
            }
        }
        self.causal_block_with(weave_index, &awareness)
    }

    /// Same as [`Weave::causal_block`], but against an awareness map the
    /// caller already computed — used by the merge engine and validation,
    /// which both need every atom's awareness anyway and would otherwise
    /// pay for a fresh `O(N)` pass per causal block they inspect.
    pub(crate) fn causal_block_with(
        &self,
        weave_index: usize,
        awareness: &BTreeMap<AtomId, Weft>,
    ) -> Option<Range<usize>> {
        if weave_index >= self.tree_len {
            return None;
        }
        let root = self.atoms.get(weave_index)?;
        awareness.get(&root.id)?;
        let mut end = weave_index + 1;
        while end < self.tree_len {
            let candidate = &self.atoms[end];
            let Some(candidate_aware) = awareness.get(&candidate.id) else {
                break;
            };
            if candidate_aware.includes(root.id) {
                end += 1;
            } else {
                break;
            }
        }
        Some(weave_index..end)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use crate::{AtomId, Weave};

    #[test]
    fn childless_root_is_a_single_element_block() {
        let mut weave: Weave<String> = Weave::new(1);
        let a = weave
            .add_atom("a".to_owned(), AtomId::START, 1)
            .expect("start is a valid cause");
        let tombstone = weave.delete_atom(a, 2).expect("a is live");
        let idx = weave.atom_weave_index(tombstone).expect("tombstone is in the weave");
        let block = weave.causal_block(idx, None).expect("tree atom has a block");
        assert_eq!(block, idx..idx + 1);
    }

    #[test]
    fn block_spans_root_and_its_descendants() {
        let mut weave: Weave<String> = Weave::new(1);
        let a = weave
            .add_atom("a".to_owned(), AtomId::START, 1)
            .expect("start is a valid cause");
        let b = weave
            .add_atom("b".to_owned(), a, 2)
            .expect("a is a valid cause");
        let a_idx = weave.atom_weave_index(a).expect("a is in the weave");
        let b_idx = weave.atom_weave_index(b).expect("b is in the weave");
        let block = weave.causal_block(a_idx, None).expect("a has a block");
        assert_eq!(block, a_idx..b_idx + 1);
    }

    #[test]
    fn unparented_root_has_no_block() {
        let weave: Weave<String> = Weave::new(1);
        let end_idx = weave.atom_weave_index(AtomId::END).expect("end is in the weave");
        assert_eq!(weave.causal_block(end_idx, None), None);
    }
}
