//! Cryptographic helpers for token handling
//!
//! Comparisons that gate authorization go through constant-time helpers
//! so response timing does not leak how much of a token matched.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Number of random bytes fed into each salt
const SALT_ENTROPY_BYTES: usize = 16;

/// Length in characters of every salt returned by [`random_salt`]
pub const SALT_LEN: usize = 64;

/// Generate a fresh salt: OS randomness hashed with SHA-256, hex encoded.
///
/// The output alphabet is `[0-9a-f]` and the length is always
/// [`SALT_LEN`], which is what lets the codec split it off unambiguously.
pub fn random_salt() -> String {
    let mut entropy = [0u8; SALT_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut entropy);
    hex::encode(Sha256::digest(entropy))
}

/// Constant-time string comparison.
///
/// Length is not treated as secret; differing lengths return early.
#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
