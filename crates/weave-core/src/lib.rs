// SPDX-License-Identifier: Apache-2.0
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![deny(unused_must_use)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::use_self)]
#![allow(clippy::cognitive_complexity)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::similar_names)]
//! A causal tree weave: a convergent replicated data type (CvRDT) for an
//! ordered collaborative document.
//!
//! Every site independently appends atoms to its own weave; sites converge
//! by exchanging full weaves and joining them with [`Weave::integrate`], an
//! associative, commutative, idempotent operation that needs no central
//! coordinator. The weave itself is a single linearization split into two
//! contiguous regions: a depth-first *tree* region rooted at a sentinel
//! `start` atom, and a causally unordered *unparented* region — tombstone
//! and awareness-commit markers — sorted by id and opening with a sentinel
//! `end` atom.
//!
//! # Layout
//!
//! - [`ident`] — `SiteId`, `YarnIndex`, `AtomId`, reserved constants.
//! - [`atom`] — the closed `AtomType` tag and the generic [`Atom`] record.
//! - [`weft`] — per-site causal cuts and their join-semilattice operations.
//! - [`yarn`] — the O(1) per-site atom index backing the weave.
//! - [`weave`] — the weave itself and its three single-atom mutators.
//! - [`awareness`] — transitive causal-dependency computation.
//! - [`merge`] — the two-pointer join engine.
//! - [`validate`] — structural invariant checking.
//!
//! # Determinism
//!
//! The value type `V` carried by every atom must be `Clone + Default`
//! (and, behind the `serde` feature, `Serialize + DeserializeOwned`) —
//! there is no other capability requirement, and no class hierarchy stands
//! in for it. When serializing, prefer a self-describing but
//! order-preserving format (this crate uses [`ciborium`] behind the
//! `serde` feature); a format like JSON that is free to reorder map keys
//! is not an acceptable substitute, since the weave's convergence
//! guarantees depend on byte-for-byte reproducible encoding for hashing
//! and transport comparisons.

mod atom;
mod awareness;
mod error;
mod ident;
mod merge;
mod validate;
mod weave;
mod weft;
mod yarn;
#[cfg(feature = "serde")]
mod wire;

pub use atom::{Atom, AtomType};
pub use error::{MergeError, ValidationError};
pub use ident::{
    unparented_atom_order, AtomId, Clock, SiteId, YarnIndex, CONTROL_SITE, END_CLOCK,
    INVALID_INDEX, INVALID_SITE, START_CLOCK,
};
pub use weave::{atom_sibling_order, Weave};
pub use weft::Weft;

#[cfg(feature = "serde")]
pub use error::WireError;
#[cfg(feature = "serde")]
pub use wire::{from_bytes, to_bytes};
