//! # Key Derivation
//!
//! The token key is a one-way function of the operator secret so the literal
//! secret is never used as key material.

use sha2::{Digest, Sha256};

/// Derive the 256-bit token key from an operator secret.
pub fn derive_key(secret: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(secret);
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}
