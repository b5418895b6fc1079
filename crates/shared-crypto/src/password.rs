//! # Password Hashing
//!
//! PBKDF2-HMAC-SHA512 with a per-call random salt, stored as
//! `hex(salt):hex(hash)`.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;
use subtle::ConstantTimeEq;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;
/// PBKDF2 iteration count.
pub const ITERATIONS: u32 = 10_000;
/// Derived hash length in bytes.
pub const HASH_LEN: usize = 64;

fn derive(password: &str, salt: &[u8]) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, ITERATIONS, &mut out);
    out
}

/// Hash a password into the `salt:hash` format.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = derive(password, &salt);
    format!("{}:{}", hex::encode(salt), hex::encode(hash))
}

/// Verify a password against a stored `salt:hash` string.
///
/// Malformed stored values verify as `false`.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, hash_hex)) = stored.split_once(':') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(hash_hex)) else {
        return false;
    };
    if expected.len() != HASH_LEN {
        return false;
    }

    let actual = derive(password, &salt);
    actual[..].ct_eq(&expected[..]).into()
}
