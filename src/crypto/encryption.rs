//! # Authenticated Encryption
//!
//! AES-256-GCM primitives used to seal envelope bodies.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        AEAD SEAL / OPEN                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  encrypt(key, plaintext, aad)                                          │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  nonce      = 12 random bytes from the OS CSPRNG           │       │
//! │  │  ciphertext = AES-256-GCM(key, nonce, plaintext, aad)      │       │
//! │  │             → plaintext.len() + 16-byte tag                │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  decrypt(key, nonce, ciphertext, aad)                                  │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  Tag verified over ciphertext AND aad before any plaintext │       │
//! │  │  is released. Any mismatch → DecryptionFailure.            │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every envelope uses a fresh ephemeral key, so the random nonce is never
//! paired with the same key twice in practice. It is still random rather
//! than fixed so a key reuse bug cannot turn into nonce reuse.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use rand::RngCore;
use zeroize::ZeroizeOnDrop;

use crate::error::{Error, Result};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Size of the encryption key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// A 96-bit AES-GCM nonce
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a cryptographically random nonce
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from existing bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// An AES-256-GCM message key
///
/// Zeroized when dropped.
#[derive(ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

/// Encrypt with AES-256-GCM under a fresh random nonce
///
/// Returns `(nonce, ciphertext_with_tag)`.
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8], aad: &[u8]) -> Result<(Nonce, Vec<u8>)> {
    let nonce = Nonce::random();
    let payload = Payload {
        msg: plaintext,
        aad,
    };

    let ciphertext = key
        .cipher()
        .encrypt(AesNonce::from_slice(&nonce.0), payload)
        .map_err(|_| Error::EncryptionFailure("AEAD encryption failed".into()))?;

    Ok((nonce, ciphertext))
}

/// Decrypt and authenticate an AES-256-GCM ciphertext
///
/// Fails with [`Error::DecryptionFailure`] if the tag does not verify
/// against the ciphertext and `aad`.
pub fn decrypt(
    key: &EncryptionKey,
    nonce: &Nonce,
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    key.cipher()
        .decrypt(AesNonce::from_slice(&nonce.0), payload)
        .map_err(|_| Error::DecryptionFailure)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> EncryptionKey {
        EncryptionKey::from_bytes([0x42; KEY_SIZE])
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = test_key();
        let (nonce, ciphertext) = encrypt(&key, b"Hello, Bob!", b"header").unwrap();

        assert_eq!(ciphertext.len(), 11 + TAG_SIZE);

        let plaintext = decrypt(&key, &nonce, &ciphertext, b"header").unwrap();
        assert_eq!(plaintext, b"Hello, Bob!");
    }

    #[test]
    fn test_wrong_aad_fails() {
        let key = test_key();
        let (nonce, ciphertext) = encrypt(&key, b"secret", b"header-a").unwrap();

        assert_eq!(
            decrypt(&key, &nonce, &ciphertext, b"header-b"),
            Err(Error::DecryptionFailure)
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let (nonce, ciphertext) = encrypt(&test_key(), b"secret", b"").unwrap();
        let other = EncryptionKey::from_bytes([0x43; KEY_SIZE]);

        assert!(decrypt(&other, &nonce, &ciphertext, b"").is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key();
        let (nonce, mut ciphertext) = encrypt(&key, b"secret", b"").unwrap();
        ciphertext[0] ^= 0x01;

        assert!(decrypt(&key, &nonce, &ciphertext, b"").is_err());
    }

    #[test]
    fn test_nonces_differ() {
        let key = test_key();
        let (n1, c1) = encrypt(&key, b"same", b"").unwrap();
        let (n2, c2) = encrypt(&key, b"same", b"").unwrap();

        assert_ne!(n1, n2);
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_empty_plaintext() {
        let key = test_key();
        let (nonce, ciphertext) = encrypt(&key, b"", b"aad").unwrap();

        assert_eq!(ciphertext.len(), TAG_SIZE);
        assert!(decrypt(&key, &nonce, &ciphertext, b"aad").unwrap().is_empty());
    }
}
