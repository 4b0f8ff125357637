//! # Key Derivation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ENVELOPE KEY DERIVATION                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   es = X25519(ephemeral, recipient)     ss = X25519(sender, recipient) │
//! │                 │                                   │                   │
//! │                 └───────────────┬───────────────────┘                   │
//! │                                 ▼                                       │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  HKDF-SHA256(                                                   │   │
//! │  │    ikm  = es || ss,                                             │   │
//! │  │    salt = ephemeral_pk || recipient_pk,                         │   │
//! │  │    info = "courier-envelope-v1"                                 │   │
//! │  │  )                                                              │   │
//! │  │                                                                 │   │
//! │  │  → 32-byte AES-256-GCM key, unique per envelope                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `es` gives each envelope a fresh key; `ss` binds the envelope to the
//! sender's long-term key so the recipient can attribute it.

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::encryption::{EncryptionKey, KEY_SIZE};
use crate::error::{Error, Result};

/// Domain separation strings
pub mod domain {
    /// HKDF info for envelope message keys
    pub const ENVELOPE_KEY: &[u8] = b"courier-envelope-v1";

    /// Hash prefix for public key fingerprints
    pub const FINGERPRINT: &[u8] = b"courier-fingerprint-v1";
}

/// Number of digest bytes shown in a fingerprint
const FINGERPRINT_BYTES: usize = 16;

/// Derive the AES-256-GCM key for one envelope
///
/// ## Errors
///
/// `EncryptionFailure` if HKDF expansion fails, which cannot happen for a
/// 32-byte output. Callers on the decryption path remap it.
pub fn derive_envelope_key(
    ephemeral_dh: &[u8; 32],
    static_dh: &[u8; 32],
    ephemeral_public: &[u8; 32],
    recipient_public: &[u8; 32],
) -> Result<EncryptionKey> {
    let mut ikm = Zeroizing::new([0u8; 64]);
    ikm[..32].copy_from_slice(ephemeral_dh);
    ikm[32..].copy_from_slice(static_dh);

    let mut salt = [0u8; 64];
    salt[..32].copy_from_slice(ephemeral_public);
    salt[32..].copy_from_slice(recipient_public);

    let hkdf = Hkdf::<Sha256>::new(Some(&salt), &ikm[..]);
    let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
    hkdf.expand(domain::ENVELOPE_KEY, &mut okm[..])
        .map_err(|_| Error::EncryptionFailure("HKDF expansion failed".into()))?;

    Ok(EncryptionKey::from_bytes(*okm))
}

/// Human-comparable fingerprint of a public key
///
/// First 16 bytes of `SHA-256(domain || algorithm || key)` as eight
/// space-separated groups of four hex digits.
pub fn key_fingerprint(algorithm: u8, key: &[u8; 32]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain::FINGERPRINT);
    hasher.update([algorithm]);
    hasher.update(key);
    let digest = hasher.finalize();

    hex::encode(&digest[..FINGERPRINT_BYTES])
        .as_bytes()
        .chunks(4)
        .map(|group| String::from_utf8_lossy(group).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::encryption::{decrypt, encrypt};

    #[test]
    fn test_derivation_is_deterministic() {
        let k1 = derive_envelope_key(&[1; 32], &[2; 32], &[3; 32], &[4; 32]).unwrap();
        let k2 = derive_envelope_key(&[1; 32], &[2; 32], &[3; 32], &[4; 32]).unwrap();

        let (nonce, ciphertext) = encrypt(&k1, b"payload", b"").unwrap();
        assert_eq!(decrypt(&k2, &nonce, &ciphertext, b"").unwrap(), b"payload");
    }

    #[test]
    fn test_every_input_changes_the_key() {
        let base = derive_envelope_key(&[1; 32], &[2; 32], &[3; 32], &[4; 32]).unwrap();
        let (nonce, ciphertext) = encrypt(&base, b"payload", b"").unwrap();

        let variants = [
            derive_envelope_key(&[9; 32], &[2; 32], &[3; 32], &[4; 32]).unwrap(),
            derive_envelope_key(&[1; 32], &[9; 32], &[3; 32], &[4; 32]).unwrap(),
            derive_envelope_key(&[1; 32], &[2; 32], &[9; 32], &[4; 32]).unwrap(),
            derive_envelope_key(&[1; 32], &[2; 32], &[3; 32], &[9; 32]).unwrap(),
        ];

        for key in &variants {
            assert!(decrypt(key, &nonce, &ciphertext, b"").is_err());
        }
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = key_fingerprint(0x01, &[7u8; 32]);

        let groups: Vec<&str> = fp.split(' ').collect();
        assert_eq!(groups.len(), 8);
        assert!(groups
            .iter()
            .all(|g| g.len() == 4 && g.chars().all(|c| c.is_ascii_hexdigit())));
    }

    #[test]
    fn test_fingerprint_depends_on_key_and_tag() {
        let fp = key_fingerprint(0x01, &[7u8; 32]);

        assert_eq!(fp, key_fingerprint(0x01, &[7u8; 32]));
        assert_ne!(fp, key_fingerprint(0x01, &[8u8; 32]));
        assert_ne!(fp, key_fingerprint(0x02, &[7u8; 32]));
    }
}
