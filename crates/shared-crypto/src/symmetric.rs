//! # Symmetric Encryption
//!
//! AES-256-GCM with a 128-bit nonce and a 128-bit tag, packed into a single
//! base64 token suitable for a cookie value.
//!
//! ## Layout
//!
//! `salt ‖ nonce ‖ tag ‖ ciphertext`. The salt is random per token and is
//! authenticated as associated data; it does not feed key derivation.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use zeroize::Zeroize;

use crate::hashing::derive_key;
use crate::CryptoError;

/// AES-256-GCM instantiated with a 16-byte nonce.
type Aes256Gcm128 = AesGcm<Aes256, U16>;

/// Reserved salt bytes at the head of every token.
pub const SALT_LEN: usize = 64;
/// Nonce length in bytes.
pub const NONCE_LEN: usize = 16;
/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;
/// Fixed header preceding the ciphertext.
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// Secret key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive from an operator-supplied secret.
    pub fn from_secret(secret: &str) -> Result<Self, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        Ok(Self(derive_key(secret.as_bytes())))
    }

    /// Generate random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Seals and opens opaque tokens under one process-wide key.
#[derive(Clone)]
pub struct TokenCipher {
    key: SecretKey,
}

impl TokenCipher {
    /// Create a cipher from an already derived key.
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Create a cipher keyed by `SHA-256(secret)`.
    pub fn from_secret(secret: &str) -> Result<Self, CryptoError> {
        SecretKey::from_secret(secret).map(Self::new)
    }

    fn cipher(&self) -> Aes256Gcm128 {
        Aes256Gcm128::new(self.key.as_bytes().into())
    }

    /// Encrypt plaintext into a base64 token.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EncryptionFailed` if the AEAD rejects the input.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let mut rng = rand::thread_rng();
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce);

        let mut buffer = plaintext.to_vec();
        let tag = self
            .cipher()
            .encrypt_in_place_detached(GenericArray::from_slice(&nonce), &salt, &mut buffer)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut token = Vec::with_capacity(HEADER_LEN + buffer.len());
        token.extend_from_slice(&salt);
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&tag);
        token.extend_from_slice(&buffer);

        Ok(BASE64.encode(token))
    }

    /// Decrypt a token produced by [`TokenCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// - `CryptoError::MalformedToken` for bad base64 or a truncated header
    /// - `CryptoError::DecryptionFailed` for any authentication failure
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, CryptoError> {
        let raw = BASE64
            .decode(token.trim())
            .map_err(|e| CryptoError::MalformedToken(e.to_string()))?;

        if raw.len() < HEADER_LEN {
            return Err(CryptoError::MalformedToken(format!(
                "token is {} bytes, header needs {}",
                raw.len(),
                HEADER_LEN
            )));
        }

        let (salt, rest) = raw.split_at(SALT_LEN);
        let (nonce, rest) = rest.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut buffer = ciphertext.to_vec();
        self.cipher()
            .decrypt_in_place_detached(
                GenericArray::from_slice(nonce),
                salt,
                &mut buffer,
                GenericArray::from_slice(tag),
            )
            .map_err(|_| CryptoError::DecryptionFailed)?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(token: &str) -> Vec<u8> {
        BASE64.decode(token).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = TokenCipher::from_secret("dashboard secret").unwrap();
        let plaintext = b"{\"host\":\"10.0.0.1\"}";

        let token = cipher.encrypt(plaintext).unwrap();
        assert_eq!(cipher.decrypt(&token).unwrap(), plaintext);
    }

    #[test]
    fn test_layout_length() {
        let cipher = TokenCipher::new(SecretKey::generate());
        let token = cipher.encrypt(b"12345").unwrap();
        assert_eq!(raw(&token).len(), HEADER_LEN + 5);
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let cipher = TokenCipher::new(SecretKey::generate());
        let a = cipher.encrypt(b"same").unwrap();
        let b = cipher.encrypt(b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails() {
        let token = TokenCipher::from_secret("old secret")
            .unwrap()
            .encrypt(b"Secret message")
            .unwrap();
        let rotated = TokenCipher::from_secret("new secret").unwrap();

        assert_eq!(rotated.decrypt(&token), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn test_every_tag_bit_flip_fails() {
        let cipher = TokenCipher::new(SecretKey::generate());
        let bytes = raw(&cipher.encrypt(b"router credential").unwrap());

        for byte in SALT_LEN + NONCE_LEN..HEADER_LEN {
            for bit in 0..8 {
                let mut tampered = bytes.clone();
                tampered[byte] ^= 1 << bit;
                let result = cipher.decrypt(&BASE64.encode(&tampered));
                assert_eq!(result, Err(CryptoError::DecryptionFailed));
            }
        }
    }

    #[test]
    fn test_tampered_ciphertext_and_salt_fail() {
        let cipher = TokenCipher::new(SecretKey::generate());
        let bytes = raw(&cipher.encrypt(b"router credential").unwrap());

        let mut body = bytes.clone();
        body[HEADER_LEN] ^= 0xFF;
        assert!(cipher.decrypt(&BASE64.encode(&body)).is_err());

        let mut salt = bytes;
        salt[0] ^= 0x01;
        assert!(cipher.decrypt(&BASE64.encode(&salt)).is_err());
    }

    #[test]
    fn test_malformed_tokens_fail_closed() {
        let cipher = TokenCipher::new(SecretKey::generate());

        assert!(matches!(
            cipher.decrypt("not base64 at all!!"),
            Err(CryptoError::MalformedToken(_))
        ));
        assert!(matches!(
            cipher.decrypt(&BASE64.encode([0u8; HEADER_LEN - 1])),
            Err(CryptoError::MalformedToken(_))
        ));
        assert!(matches!(cipher.decrypt(""), Err(CryptoError::MalformedToken(_))));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            TokenCipher::from_secret(""),
            Err(CryptoError::EmptySecret)
        ));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(plaintext in proptest::collection::vec(any::<u8>(), 0..512)) {
            let cipher = TokenCipher::from_secret("prop secret").unwrap();
            let token = cipher.encrypt(&plaintext).unwrap();
            prop_assert_eq!(cipher.decrypt(&token).unwrap(), plaintext);
        }
    }
}
