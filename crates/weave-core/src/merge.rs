// SPDX-License-Identifier: Apache-2.0
//! The merge engine: a two-pointer O(N) walk over a local and a remote
//! weave that produces a commutative, associative, idempotent join.

use std::cmp::Ordering;
use std::ops::Range;

use crate::atom::Atom;
use crate::error::MergeError;
use crate::weave::{atom_sibling_order, Weave};
use crate::weft::Weft;
use crate::yarn::YarnCache;

/// A pending run of contiguous remote atoms destined for the same local
/// insertion point. Kept open across loop iterations so adjacent remote
/// atoms collapse into one range instead of one insertion per atom.
struct PendingInsert {
    local_index: usize,
    remote_range: Range<usize>,
}

impl<V: Clone + Default> Weave<V> {
    /// Merges `other` into `self` in place.
    ///
    /// Both weaves are assumed to independently satisfy [`Weave::validate`]
    /// — the seven cases below never arise from integrating two
    /// well-formed weaves except case G, which always indicates the remote
    /// weave is malformed (spec §7 class 3). A conforming caller validates
    /// an untrusted remote before calling this.
    pub fn integrate(&mut self, other: &Weave<V>) -> Result<(), MergeError> {
        let local_weft = self.weft.clone();
        let remote_weft = other.weft.clone();
        // Computed once up front rather than lazily per case-F conflict: both
        // are already O(N), and a weave with many unaware-sibling conflicts
        // would otherwise pay for a fresh full pass at every one of them.
        let local_awareness_map = self.all_awareness();
        let remote_awareness_map = other.all_awareness();

        let mut i = 0usize;
        let mut j = 0usize;
        let mut pending: Option<PendingInsert> = None;
        let mut insertions: Vec<(usize, Range<usize>)> = Vec::new();

        macro_rules! flush {
            () => {
                if let Some(p) = pending.take() {
                    insertions.push((p.local_index, p.remote_range));
                }
            };
        }

        macro_rules! queue_insert {
            ($local_idx:expr, $remote_idx:expr) => {{
                let local_idx = $local_idx;
                let remote_idx = $remote_idx;
                match &mut pending {
                    Some(p) if p.local_index == local_idx && p.remote_range.end == remote_idx => {
                        p.remote_range.end += 1;
                    }
                    _ => {
                        flush!();
                        pending = Some(PendingInsert {
                            local_index: local_idx,
                            remote_range: remote_idx..remote_idx + 1,
                        });
                    }
                }
            }};
        }

        while j < other.atoms.len() {
            if i >= self.atoms.len() {
                // Case A: local is exhausted; everything left in remote tails on.
                queue_insert!(i, j);
                j += 1;
                continue;
            }

            let local_id = self.atoms[i].id;
            let remote_id = other.atoms[j].id;

            if local_id == remote_id {
                // Case B.
                flush!();
                i += 1;
                j += 1;
                continue;
            }

            if self.atoms[i].ty.unparented() && other.atoms[j].ty.unparented() {
                // Case C.
                match local_id.cmp(&remote_id) {
                    Ordering::Equal => {
                        flush!();
                        i += 1;
                        j += 1;
                    }
                    Ordering::Less => {
                        flush!();
                        i += 1;
                    }
                    Ordering::Greater => {
                        queue_insert!(i, j);
                        j += 1;
                    }
                }
                continue;
            }

            if local_weft.includes(remote_id) {
                // Case D: remote atom is already present further along local.
                // Fast-forward local without moving j; the next iteration
                // re-enters at the matching id and takes case B.
                flush!();
                loop {
                    i += 1;
                    if i >= self.atoms.len() {
                        return Err(MergeError::MissingClaimedAtom {
                            site: remote_id.site,
                            missing: remote_id,
                        });
                    }
                    if self.atoms[i].id == remote_id {
                        break;
                    }
                }
                continue;
            }

            if remote_weft.includes(local_id) {
                // Case E: local atom is already present further along remote.
                loop {
                    queue_insert!(i, j);
                    j += 1;
                    if j >= other.atoms.len() {
                        return Err(MergeError::MissingClaimedAtom {
                            site: local_id.site,
                            missing: local_id,
                        });
                    }
                    if other.atoms[j].id == local_id {
                        break;
                    }
                }
                continue;
            }

            if self.atoms[i].cause == other.atoms[j].cause {
                // Case F: unaware siblings under the same parent.
                flush!();
                let local_awareness = local_awareness_map.get(&local_id).cloned().unwrap_or_default();
                let remote_awareness = remote_awareness_map.get(&remote_id).cloned().unwrap_or_default();
                if self.atoms[i].ty.priority() == other.atoms[j].ty.priority()
                    && local_awareness == remote_awareness
                {
                    // Spec §4.4: "same priority, equal awareness" ties must
                    // not occur for distinct atoms in a well-formed weave.
                    // `Weft::more_aware_than` always returns a definite bool
                    // via its lexicographic tiebreak, so without this check
                    // a tie would silently fall through to the "insert
                    // remote" branch below instead of surfacing the
                    // malformed input.
                    return Err(MergeError::SiblingTie {
                        local: local_id,
                        remote: remote_id,
                    });
                }
                let local_block = self
                    .causal_block_with(i, &local_awareness_map)
                    .ok_or(MergeError::Unresolvable {
                        local: local_id,
                        remote: remote_id,
                    })?;
                let remote_block = other
                    .causal_block_with(j, &remote_awareness_map)
                    .ok_or(MergeError::Unresolvable {
                        local: local_id,
                        remote: remote_id,
                    })?;
                let local_more_aware = local_awareness.more_aware_than(&remote_awareness);
                if atom_sibling_order(&self.atoms[i], &other.atoms[j], local_more_aware) {
                    i += local_block.len();
                } else {
                    j = remote_block.end;
                    insertions.push((i, remote_block));
                }
                continue;
            }

            // Case G: no rule left to order these two atoms.
            return Err(MergeError::Unresolvable {
                local: local_id,
                remote: remote_id,
            });
        }
        flush!();

        // Checked against the pre-merge yarn caches, before any insertion is
        // applied to `self.atoms`: if this fails, `self` must come back
        // untouched (spec §7 class 3 — never silently corrupt the local
        // weave), and the prefix question only ever depends on what each
        // side already had, not on the merged order.
        self.assert_prefix_consistency(other)?;

        apply_insertions(&mut self.atoms, &other.atoms, insertions);
        self.rebuild_cache();
        Ok(())
    }

    /// Spec §4.8's prefix-consistency assertion: a site present in both
    /// weaves must agree on every yarn index both sides have in common, or
    /// the remote weave disagrees with causal history already accepted
    /// locally.
    fn assert_prefix_consistency(&self, other: &Weave<V>) -> Result<(), MergeError> {
        for site in other.yarns.sites() {
            let local_yarn = self.yarns.yarn(site);
            let remote_yarn = other.yarn(site);
            let prefix_len = local_yarn.len().min(remote_yarn.len());
            for idx in 0..prefix_len {
                if local_yarn[idx].id != remote_yarn[idx].id {
                    return Err(MergeError::PrefixMismatch { site });
                }
            }
        }
        Ok(())
    }

    /// Rebuilds `tree_len`, the yarn cache, and the weft from the merged
    /// weave order. Infallible: by the time this runs, insertions are
    /// already applied and prefix consistency already checked.
    fn rebuild_cache(&mut self) {
        let mut tree_len = 0usize;
        let mut yarns = YarnCache::new();
        let mut weft = Weft::new();
        for atom in &self.atoms {
            if !atom.ty.unparented() {
                tree_len += 1;
            }
            weft.update(atom.id);
            yarns.push(atom.clone());
        }
        self.tree_len = tree_len;
        self.yarns = yarns;
        self.weft = weft;
    }
}

/// Applies queued `(local_index, remote_range)` insertions to `local` in
/// descending `local_index` order, so earlier indices stay valid as later
/// ones are spliced in. Two insertions can legitimately share a
/// `local_index` (e.g. two separate case-F sibling blocks both losing to
/// the same local atom back to back); ties break on descending
/// `remote_range.start` — since `j` only ever advances during the scan,
/// that recovers scan order, and inserting the later-discovered range
/// first is what leaves the earlier one to its left in the final splice.
fn apply_insertions<V: Clone>(
    local: &mut Vec<Atom<V>>,
    remote: &[Atom<V>],
    mut insertions: Vec<(usize, Range<usize>)>,
) {
    insertions.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(b.1.start.cmp(&a.1.start)));
    for (local_index, remote_range) in insertions {
        for (offset, atom) in remote[remote_range].iter().cloned().enumerate() {
            local.insert(local_index + offset, atom);
        }
    }
}
