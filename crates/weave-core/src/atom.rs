// SPDX-License-Identifier: Apache-2.0
//! The immutable unit of the causal tree.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ident::{AtomId, Clock};

/// The closed set of atom kinds.
///
/// Each variant is associated with three boolean facets (`unparented`,
/// `childless`, `priority`) computed as plain `const fn`s rather than stored
/// per-instance — there is no dynamic dispatch here, matching the "no
/// inheritance, no polymorphic object" design note: the type is a closed,
/// precomputed tag, not a trait object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AtomType {
    /// The single root of the tree region, at weave index 0.
    Start,
    /// The sentinel head of the unparented region.
    End,
    /// An ordinary, live, content-bearing atom.
    None,
    /// A tombstone: marks its `cause` as deleted.
    Delete,
    /// An unparented "weak" dependency marker emitted by `addCommit`.
    Commit,
}

impl AtomType {
    /// `true` for atoms that live in the unparented (tail) region: `commit`
    /// and `end`.
    #[must_use]
    pub const fn unparented(self) -> bool {
        matches!(self, Self::Commit | Self::End)
    }

    /// `true` for atoms that may never receive children: `delete` and `end`.
    #[must_use]
    pub const fn childless(self) -> bool {
        matches!(self, Self::Delete | Self::End)
    }

    /// `true` for atoms that sort before their non-priority siblings
    /// regardless of awareness: only `delete`.
    #[must_use]
    pub const fn priority(self) -> bool {
        matches!(self, Self::Delete)
    }
}

/// An immutable node of the causal tree.
///
/// Atoms are created once (by their owning site, with the next yarn index
/// for that site) and never mutated afterward; `Weave::remap_indices` may
/// renumber sites globally but never touches an atom's semantic content.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(bound(serialize = "V: Serialize", deserialize = "V: Deserialize<'de>"))
)]
pub struct Atom<V> {
    /// Unique identifier of this atom.
    pub id: AtomId,
    /// Causal parent. [`AtomId::NULL`] for unparented atoms.
    pub cause: AtomId,
    /// Informational clock hint; never authoritative for placement.
    pub clock: Clock,
    /// User payload, opaque to the weave.
    pub value: V,
    /// Optional non-causal "weak" link (e.g. a commit's target yarn tail).
    /// [`AtomId::NULL`] if absent.
    pub reference: AtomId,
    /// The atom's kind.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub ty: AtomType,
}

impl<V> Atom<V> {
    /// `true` if this atom has no causal parent and lives in the unparented
    /// region.
    #[must_use]
    pub const fn is_unparented(&self) -> bool {
        self.ty.unparented()
    }
}
