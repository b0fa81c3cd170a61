// SPDX-License-Identifier: Apache-2.0
//! Error types. Precondition failures in mutation stay `Option<AtomId>`
//! (spec §7 class 2) — these enums cover only validation failures (class 1)
//! and merge failures (class 3), which are programmer-visible bugs in a
//! malformed weave rather than routine outcomes.

use crate::ident::{AtomId, SiteId};

/// Why [`crate::Weave::validate`] rejected a weave.
///
/// Spec §4.10 enumerates this exact closed set; validation never returns any
/// other kind of failure.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum ValidationError {
    /// The weave has no atoms at all.
    #[error("weave has no atoms")]
    NoAtoms,
    /// The weave has no sites.
    #[error("weave has no sites")]
    NoSites,
    /// A full round-robin pass over all yarns made zero progress while
    /// computing awareness: some atom's dependencies can never become
    /// available, i.e. a cycle or a dangling reference.
    #[error("causality violation: no atom could be resolved in a full pass")]
    CausalityViolation,
    /// A tree atom's awareness weft does not include its own `cause`.
    #[error("atom {atom} is unaware of its cause {cause}")]
    AtomUnawareOfParent {
        /// The atom that fails the check.
        atom: AtomId,
        /// Its causal parent.
        cause: AtomId,
    },
    /// A tree atom's awareness weft does not include its own `reference`.
    #[error("atom {atom} is unaware of its reference {reference}")]
    AtomUnawareOfReference {
        /// The atom that fails the check.
        atom: AtomId,
        /// Its weak reference.
        reference: AtomId,
    },
    /// A childless atom (`delete` or `end`) has a child in the weave.
    #[error("childless atom {atom} has a child")]
    ChildlessAtomHasChildren {
        /// The childless atom.
        atom: AtomId,
    },
    /// A tree-region atom is marked `unparented`.
    #[error("tree atom {atom} is unparented")]
    TreeAtomIsUnparented {
        /// The offending atom.
        atom: AtomId,
    },
    /// An unparented-region atom has a non-null `cause`.
    #[error("unparented atom {atom} has a cause")]
    UnparentedAtomIsParented {
        /// The offending atom.
        atom: AtomId,
    },
    /// Two adjacent siblings in the tree region violate the canonical
    /// sibling order.
    #[error("tree atoms {left} and {right} are out of sibling order")]
    IncorrectTreeAtomOrder {
        /// The earlier atom in weave order.
        left: AtomId,
        /// The later atom in weave order.
        right: AtomId,
    },
    /// Two adjacent atoms in the unparented region are not strictly
    /// increasing by `AtomId`.
    #[error("unparented atoms {left} and {right} are out of order")]
    IncorrectUnparentedAtomOrder {
        /// The earlier atom in weave order.
        left: AtomId,
        /// The later atom in weave order.
        right: AtomId,
    },
    /// The first atom of the unparented region is not `(ControlSite, 1)`.
    #[error("unparented region does not begin with the end atom")]
    MissingStartOfUnparentedSection,
    /// The weave carries more sites than validation can afford to check
    /// given its current (matrix) awareness strategy (spec §9 open
    /// question 4). Kept as a distinct, named failure rather than an
    /// unbounded hang.
    #[error("likely corruption: site count too large to validate safely")]
    LikelyCorruption,
}

/// Why a single-atom placement (`addAtom`/`deleteAtom`/`addCommit`) could
/// not be integrated into the weave. These map to `None` at the public
/// API (spec §7 class 2); the enum exists only so the private
/// implementation can describe the reason internally and in tests.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub(crate) enum PlacementError {
    #[error("cause {0} not found in weave")]
    CauseNotFound(AtomId),
    #[error("cause {0} is childless")]
    CauseIsChildless(AtomId),
    #[error("unparented atom may not have a cause")]
    UnparentedAtomHasCause,
}

/// Why [`crate::Weave::integrate`] (the CvRDT merge) failed.
///
/// Per spec §7 class 3, every variant here indicates the *remote* weave was
/// malformed (not causally valid, or two distinct atoms claim the same
/// sibling slot with no resolvable order) — not a bug reachable by
/// integrating two weaves that both independently satisfy
/// [`crate::Weave::validate`]. A conforming caller validates untrusted
/// remotes before integrating them.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum MergeError {
    /// Case G: two atoms at the same weave position are unequal, mutually
    /// unaware of each other, and do not share a `cause` — there is no rule
    /// left to order them.
    #[error("atoms {local} and {remote} are unequal, mutually unaware, and not siblings")]
    Unresolvable {
        /// The local atom at the point of divergence.
        local: AtomId,
        /// The remote atom at the point of divergence.
        remote: AtomId,
    },
    /// A fast-forward scan (case D or E) ran off the end of a weave without
    /// finding the atom its own weft claimed to include.
    #[error("weft for site {site} claims atom {missing} but it is absent from the weave")]
    MissingClaimedAtom {
        /// The site whose weft made the claim.
        site: SiteId,
        /// The atom it claimed to include.
        missing: AtomId,
    },
    /// Post-merge cache rebuild (spec §4.8) found that the remote yarn for
    /// `site` disagrees with the local yarn's existing prefix.
    #[error("prefix mismatch rebuilding yarn cache for site {site}")]
    PrefixMismatch {
        /// The site whose yarn prefixes disagree.
        site: SiteId,
    },
    /// Case F: two distinct unaware siblings share both `priority` and
    /// awareness weft, so [`crate::atom_sibling_order`] has no basis left to
    /// order them. Spec §4.4 states this must not occur in a well-formed
    /// weave; reaching it means the remote side is malformed.
    #[error("siblings {local} and {remote} tie on priority and awareness")]
    SiblingTie {
        /// The local atom at the point of the tie.
        local: AtomId,
        /// The remote atom at the point of the tie.
        remote: AtomId,
    },
}

/// Errors from the optional deterministic-CBOR persistence helpers.
#[cfg(feature = "serde")]
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Encoding to CBOR failed.
    #[error("failed to encode weave: {0}")]
    Encode(String),
    /// Decoding from CBOR failed.
    #[error("failed to decode weave: {0}")]
    Decode(String),
}
