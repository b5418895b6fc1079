//! # Shared Crypto - Session Token and Password Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | AES-256-GCM, 128-bit nonce | Session token sealing |
//! | `hashing` | SHA-256 | Process key derivation from the operator secret |
//! | `password` | PBKDF2-HMAC-SHA512 | One-way password storage |
//!
//! ## Token Layout
//!
//! ```text
//! base64( salt[64] ‖ nonce[16] ‖ tag[16] ‖ ciphertext[..] )
//! ```
//!
//! ## Security Properties
//!
//! - Decryption fails closed: bad base64, truncation and tag mismatch are all
//!   typed errors, never partial plaintext
//! - Rotating the operator secret invalidates every issued token
//! - Password verification compares full digests in constant time

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod password;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use hashing::derive_key;
pub use password::{hash_password, verify_password};
pub use symmetric::{SecretKey, TokenCipher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
