//! Content revision hashing
//!
//! Revision = first 12 hex characters of SHA-256 over a canonical
//! serialization of the EDL with its `revision` field cleared.
//!
//! The canonical form is the serde JSON serialization of the document
//! model: declaration-order fields, compact separators, absent fades
//! omitted, shortest-round-trip float formatting. Identical documents
//! therefore always produce identical revisions, and any significant
//! field change produces a different one.

use sha2::{Digest, Sha256};
use waveforge_common::model::Edl;

/// Number of hex characters kept from the full SHA-256 digest
const REVISION_LEN: usize = 12;

/// Canonical serialization used for revision hashing.
///
/// The input's `revision` field is ignored so that stamping a revision
/// into a document does not change its revision.
pub fn canonical_json(edl: &Edl) -> String {
    let mut cleared = edl.clone();
    cleared.revision = String::new();
    // Struct serialization to a string cannot fail
    serde_json::to_string(&cleared).unwrap_or_default()
}

/// Derive the content revision of an EDL.
pub fn revision_of(edl: &Edl) -> String {
    let canonical = canonical_json(edl);
    let digest = Sha256::digest(canonical.as_bytes());
    let mut hex = String::with_capacity(REVISION_LEN);
    for byte in digest.iter().take(REVISION_LEN / 2) {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}
