// SPDX-License-Identifier: Apache-2.0
//! Deterministic CBOR persistence, gated behind the `serde` feature.
//!
//! The wire envelope is exactly the `{owner, atoms}` pair of spec §6, atoms
//! in weave order. [`ciborium`] is used rather than a JSON encoder: CBOR
//! preserves map and array ordering byte-for-byte, which a JSON encoder is
//! free not to do for maps. This crate never exposes a JSON path for
//! [`Weave`] for that reason.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::WireError;
use crate::ident::SiteId;
use crate::weave::Weave;

#[derive(Serialize, Deserialize)]
struct Envelope<V> {
    owner: SiteId,
    atoms: Vec<crate::atom::Atom<V>>,
}

/// Encodes `weave` as deterministic CBOR bytes: the weave order verbatim,
/// with caches omitted (they are rebuilt on load).
pub fn to_bytes<V>(weave: &Weave<V>) -> Result<Vec<u8>, WireError>
where
    V: Clone + Default + Serialize,
{
    let envelope = Envelope {
        owner: weave.owner(),
        atoms: weave.weave().to_vec(),
    };
    let mut buf = Vec::new();
    ciborium::into_writer(&envelope, &mut buf).map_err(|e| WireError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Decodes CBOR bytes produced by [`to_bytes`] back into a weave, rebuilding
/// the yarn cache and weft. Does not validate — call [`Weave::validate`] if
/// `bytes` came from an untrusted source.
pub fn from_bytes<V>(bytes: &[u8]) -> Result<Weave<V>, WireError>
where
    V: Clone + Default + DeserializeOwned,
{
    let envelope: Envelope<V> =
        ciborium::from_reader(bytes).map_err(|e| WireError::Decode(e.to_string()))?;
    Ok(Weave::from_serialized(envelope.owner, envelope.atoms))
}
