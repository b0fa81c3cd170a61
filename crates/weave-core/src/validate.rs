// SPDX-License-Identifier: Apache-2.0
//! Structural validation of a weave, independent of how it was built.
//!
//! Unlike [`crate::awareness`], which assumes its input is already a valid
//! weave (an untrusted cycle would overflow its DFS stack), validation must
//! survive arbitrary, possibly-corrupt input — including a `fromSerialized`
//! weave nobody has checked yet. It therefore recomputes awareness with its
//! own defensive round-robin pass that detects a stuck causal graph instead
//! of assuming one can't happen.

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::ident::AtomId;
use crate::weave::{atom_sibling_order, Weave};
use crate::weft::Weft;

impl<V: Clone + Default> Weave<V> {
    /// Checks every invariant in the data model against the current state.
    ///
    /// Does not itself cap the number of distinct sites: the round-robin
    /// awareness pass below is `O(N)` total (each yarn index is visited
    /// once per pass, and a pass either makes progress or the weave is
    /// rejected), not the `O(N·S)` matrix the spec's open question 4 warns
    /// about, so there is no quadratic blowup to guard against by refusing
    /// large site counts. [`ValidationError::LikelyCorruption`] is kept in
    /// the error enum for interface parity but is never returned by this
    /// implementation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.atoms.len() < 2 {
            return Err(ValidationError::NoAtoms);
        }
        if self.yarns.sites().next().is_none() {
            return Err(ValidationError::NoSites);
        }
        if self.atoms.len() != self.yarns.len() {
            // Spec §4.10 item 1 / invariant I1: every atom appears exactly
            // once in the weave and exactly once in its yarn. A mismatch here
            // means the weave vector and the yarn cache have desynced —
            // reused as `CausalityViolation` rather than a dedicated variant,
            // the same way `validate_unparented_region` treats a broken
            // tree/unparented partition as a causality failure rather than a
            // narrower, enumerated ordering error.
            return Err(ValidationError::CausalityViolation);
        }

        let awareness = self.round_robin_awareness()?;

        self.validate_tree_region(&awareness)?;
        self.validate_unparented_region()?;
        Ok(())
    }

    /// Spec §4.10.2: iterate every yarn round-robin, advancing a yarn's
    /// cursor only when the atom at it has its `cause` and `reference`
    /// already resolved (same-site predecessors are resolved automatically
    /// since a yarn's cursor only ever advances in order). A full pass
    /// over every yarn with zero cursor advances means some dependency can
    /// never resolve — a cycle or a dangling reference.
    fn round_robin_awareness(&self) -> Result<BTreeMap<AtomId, Weft>, ValidationError> {
        let sites: Vec<_> = self.yarns.sites().collect();
        let mut cursors: BTreeMap<_, usize> = sites.iter().map(|&s| (s, 0usize)).collect();
        let mut awareness: BTreeMap<AtomId, Weft> = BTreeMap::new();
        let total: usize = sites.iter().map(|&s| self.yarn(s).len()).sum();

        let mut resolved = 0usize;
        loop {
            let mut progressed = false;
            for &site in &sites {
                let yarn = self.yarn(site);
                let Some(cursor) = cursors.get_mut(&site) else {
                    continue;
                };
                while *cursor < yarn.len() {
                    let atom = &yarn[*cursor];
                    let cause_ready = atom.cause.is_null() || awareness.contains_key(&atom.cause);
                    let reference_ready =
                        atom.reference.is_null() || awareness.contains_key(&atom.reference);
                    if !cause_ready || !reference_ready {
                        break;
                    }
                    let mut aware = Weft::new();
                    aware.update(atom.id);
                    if !atom.cause.is_null() {
                        if let Some(w) = awareness.get(&atom.cause) {
                            aware = aware.joined(w);
                        }
                    }
                    if !atom.reference.is_null() {
                        if let Some(w) = awareness.get(&atom.reference) {
                            aware = aware.joined(w);
                        }
                    }
                    awareness.insert(atom.id, aware);
                    *cursor += 1;
                    resolved += 1;
                    progressed = true;
                }
            }
            if resolved == total {
                return Ok(awareness);
            }
            if !progressed {
                return Err(ValidationError::CausalityViolation);
            }
        }
    }

    fn validate_tree_region(&self, awareness: &BTreeMap<AtomId, Weft>) -> Result<(), ValidationError> {
        let mut last_child_of: BTreeMap<AtomId, (usize, AtomId)> = BTreeMap::new();

        for idx in 0..self.tree_len {
            let atom = &self.atoms[idx];
            if atom.ty.unparented() {
                return Err(ValidationError::TreeAtomIsUnparented { atom: atom.id });
            }
            if idx == 0 {
                continue;
            }

            let cause_idx = self
                .atom_weave_index(atom.cause)
                .filter(|&ci| ci < idx)
                .ok_or(ValidationError::CausalityViolation)?;
            if self.atoms[cause_idx].ty.childless() {
                return Err(ValidationError::ChildlessAtomHasChildren {
                    atom: self.atoms[cause_idx].id,
                });
            }

            let aware = awareness.get(&atom.id).ok_or(ValidationError::CausalityViolation)?;
            if !aware.includes(atom.cause) {
                return Err(ValidationError::AtomUnawareOfParent {
                    atom: atom.id,
                    cause: atom.cause,
                });
            }
            if !atom.reference.is_null() && !aware.includes(atom.reference) {
                return Err(ValidationError::AtomUnawareOfReference {
                    atom: atom.id,
                    reference: atom.reference,
                });
            }

            let block_end = self
                .causal_block_with(idx, awareness)
                .map_or(idx + 1, |r| r.end);

            if let Some(&(prev_end, prev_id)) = last_child_of.get(&atom.cause) {
                if prev_end == idx {
                    let prev_atom = self.atom_for_id(prev_id).ok_or(ValidationError::CausalityViolation)?;
                    let prev_aware = awareness.get(&prev_id).ok_or(ValidationError::CausalityViolation)?;
                    let prev_more_aware = prev_aware.more_aware_than(aware);
                    if !atom_sibling_order(prev_atom, atom, prev_more_aware) {
                        return Err(ValidationError::IncorrectTreeAtomOrder {
                            left: prev_id,
                            right: atom.id,
                        });
                    }
                }
            }
            last_child_of.insert(atom.cause, (block_end, atom.id));
        }
        Ok(())
    }

    fn validate_unparented_region(&self) -> Result<(), ValidationError> {
        if self.tree_len >= self.atoms.len() {
            return Err(ValidationError::MissingStartOfUnparentedSection);
        }
        if self.atoms[self.tree_len].id != AtomId::END {
            return Err(ValidationError::MissingStartOfUnparentedSection);
        }
        for idx in self.tree_len..self.atoms.len() {
            let atom = &self.atoms[idx];
            if !atom.ty.unparented() {
                // A non-unparented atom past `tree_len` breaks the
                // fundamental tree/unparented partition itself, not just
                // sibling order within one region.
                return Err(ValidationError::CausalityViolation);
            }
            if !atom.cause.is_null() {
                return Err(ValidationError::UnparentedAtomIsParented { atom: atom.id });
            }
            if idx > self.tree_len {
                let prev = &self.atoms[idx - 1];
                if prev.id >= atom.id {
                    return Err(ValidationError::IncorrectUnparentedAtomOrder {
                        left: prev.id,
                        right: atom.id,
                    });
                }
            }
        }
        Ok(())
    }
}
