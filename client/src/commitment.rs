//! SHA-256 hash commitments.
//!
//! A commitment binds the escrow to a secret without revealing it: the
//! opener stores `sha256(secret)` as 64 hex characters, and the escrow
//! releases only when the proof program attests that a submitted preimage
//! hashes to the same digest.

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
pub const COMMITMENT_LEN: usize = 64;

/// Hash a secret into its commitment: lowercase hex of `sha256(secret)`.
pub fn commit(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// True iff `s` matches `^[0-9a-fA-F]{64}$`.
///
/// Mixed case is accepted; the program stores whatever casing the opener
/// committed, and the proof side compares after trimming only.
pub fn validate_format(s: &str) -> bool {
    s.len() == COMMITMENT_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
