//! Opening envelopes addressed to the local identity.
//!
//! Every failure, whatever its cause, is reported as the same
//! [`Error::DecryptionFailure`] value. Once the length checks pass, the
//! key agreement, key derivation and tag check always run; the structural
//! checks are only consulted afterwards.

use std::fmt;

use x25519_dalek::PublicKey as X25519PublicKey;
use zeroize::{Zeroize, Zeroizing};

use super::{envelope_len, AAD_LEN, DEFAULT_MAX_PLAINTEXT_LEN, ENVELOPE_VERSION, MIN_ENVELOPE_LEN};
use crate::crypto::{self, IdentityKeyPair, Nonce, PublicKey, NONCE_SIZE, PUBLIC_KEY_SIZE};
use crate::error::{Error, Result};

/// A successfully opened envelope
///
/// The plaintext buffer is wiped when the message is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct OpenedMessage {
    /// Decrypted message bytes
    pub plaintext: Zeroizing<Vec<u8>>,
    /// Authenticated long-term key of the sender
    pub sender: PublicKey,
}

impl fmt::Debug for OpenedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedMessage")
            .field("plaintext_len", &self.plaintext.len())
            .field("sender", &self.sender)
            .finish()
    }
}

/// Opens envelopes produced by [`EncryptionEngine`](super::EncryptionEngine)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionEngine {
    max_plaintext_len: usize,
}

impl Default for DecryptionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PLAINTEXT_LEN)
    }
}

impl DecryptionEngine {
    /// Create an engine that refuses envelopes above the size implied by
    /// `max_plaintext_len`
    pub fn new(max_plaintext_len: usize) -> Self {
        Self { max_plaintext_len }
    }

    /// Largest envelope this engine will attempt to open
    pub fn max_envelope_len(&self) -> usize {
        envelope_len(self.max_plaintext_len)
    }

    /// Decrypt an envelope with the local key pair
    ///
    /// The returned buffer is owned by the caller and is not wiped on drop;
    /// use [`open`](Self::open) to keep it in a [`Zeroizing`] wrapper.
    pub fn decrypt(&self, envelope: &[u8], local: &IdentityKeyPair) -> Result<Vec<u8>> {
        let mut opened = self.open(envelope, local)?;
        Ok(std::mem::take(&mut *opened.plaintext))
    }

    /// Decrypt an envelope and return the authenticated sender key with it
    pub fn open(&self, envelope: &[u8], local: &IdentityKeyPair) -> Result<OpenedMessage> {
        if envelope.len() < MIN_ENVELOPE_LEN || envelope.len() > self.max_envelope_len() {
            return Err(Error::DecryptionFailure);
        }

        let (aad, body) = envelope.split_at(AAD_LEN);
        let (nonce_bytes, sealed) = body.split_at(NONCE_SIZE);
        let sender_bytes = key_bytes(&aad[1..1 + PUBLIC_KEY_SIZE]);
        let ephemeral_bytes = key_bytes(&aad[1 + PUBLIC_KEY_SIZE..]);

        let ephemeral_dh = local.agree(&X25519PublicKey::from(ephemeral_bytes));
        let static_dh = local.agree(&X25519PublicKey::from(sender_bytes));

        let mut well_formed = aad[0] == ENVELOPE_VERSION;
        well_formed &= ephemeral_dh.was_contributory();
        well_formed &= static_dh.was_contributory();

        let key = crypto::derive_envelope_key(
            ephemeral_dh.as_bytes(),
            static_dh.as_bytes(),
            &ephemeral_bytes,
            local.public_key().as_bytes(),
        )
        .map_err(|_| Error::DecryptionFailure)?;

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(nonce_bytes);

        let mut plaintext = crypto::decrypt(&key, &Nonce::from_bytes(nonce), sealed, aad)?;

        let sender = match PublicKey::from_bytes(sender_bytes) {
            Ok(sender) if well_formed => sender,
            _ => {
                plaintext.zeroize();
                return Err(Error::DecryptionFailure);
            }
        };

        tracing::debug!(
            envelope_len = envelope.len(),
            plaintext_len = plaintext.len(),
            "Opened envelope from {}",
            sender.fingerprint()
        );

        Ok(OpenedMessage {
            plaintext: Zeroizing::new(plaintext),
            sender,
        })
    }
}

fn key_bytes(slice: &[u8]) -> [u8; PUBLIC_KEY_SIZE] {
    let mut out = [0u8; PUBLIC_KEY_SIZE];
    out.copy_from_slice(slice);
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EncryptionEngine, HEADER_LEN};

    fn seal(plaintext: &[u8], sender: &IdentityKeyPair, recipient: &IdentityKeyPair) -> Vec<u8> {
        EncryptionEngine::default()
            .encrypt(plaintext, recipient.public_key(), sender)
            .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();

        let envelope = seal(b"meet at noon", &alice, &bob);
        let opened = DecryptionEngine::default().open(&envelope, &bob).unwrap();

        assert_eq!(&opened.plaintext[..], b"meet at noon");
        assert_eq!(opened.sender, *alice.public_key());
    }

    #[test]
    fn test_opened_plaintext_is_zeroizing() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();
        let envelope = seal(b"short lived", &alice, &bob);

        let mut opened = DecryptionEngine::default().open(&envelope, &bob).unwrap();
        let plaintext: &mut Zeroizing<Vec<u8>> = &mut opened.plaintext;
        assert_eq!(&plaintext[..], b"short lived");

        plaintext.zeroize();
        assert!(opened.plaintext.is_empty());

        let debug = format!("{:?}", opened);
        assert!(debug.contains("plaintext_len: 0"));
        assert!(!debug.contains("short lived"));
    }

    #[test]
    fn test_empty_and_limit_sized_plaintext() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();
        let limit = 4096;
        let encryptor = EncryptionEngine::new(limit);
        let decryptor = DecryptionEngine::new(limit);

        let empty = encryptor.encrypt(b"", bob.public_key(), &alice).unwrap();
        assert!(decryptor.decrypt(&empty, &bob).unwrap().is_empty());

        let full: Vec<u8> = (0..limit).map(|i| (i % 251) as u8).collect();
        let envelope = encryptor.encrypt(&full, bob.public_key(), &alice).unwrap();
        assert_eq!(envelope.len(), decryptor.max_envelope_len());
        assert_eq!(decryptor.decrypt(&envelope, &bob).unwrap(), full);
    }

    #[test]
    fn test_self_addressed() {
        let alice = IdentityKeyPair::generate();
        let envelope = seal(b"note to self", &alice, &alice);

        assert_eq!(
            DecryptionEngine::default().decrypt(&envelope, &alice).unwrap(),
            b"note to self"
        );
    }

    #[test]
    fn test_wrong_key_pair_fails() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();
        let eve = IdentityKeyPair::generate();

        let envelope = seal(b"for bob only", &alice, &bob);

        assert_eq!(
            DecryptionEngine::default().decrypt(&envelope, &eve),
            Err(Error::DecryptionFailure)
        );
    }

    #[test]
    fn test_every_single_byte_flip_fails() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();
        let engine = DecryptionEngine::default();

        let envelope = seal(b"hello", &alice, &bob);
        for i in 0..envelope.len() {
            let mut tampered = envelope.clone();
            tampered[i] ^= 0x01;
            assert_eq!(
                engine.decrypt(&tampered, &bob),
                Err(Error::DecryptionFailure),
                "flip at byte {} was accepted",
                i
            );
        }
    }

    #[test]
    fn test_length_bounds() {
        let bob = IdentityKeyPair::generate();
        let engine = DecryptionEngine::new(8);

        assert_eq!(engine.decrypt(&[], &bob), Err(Error::DecryptionFailure));
        assert_eq!(
            engine.decrypt(&[ENVELOPE_VERSION; MIN_ENVELOPE_LEN - 1], &bob),
            Err(Error::DecryptionFailure)
        );
        assert_eq!(
            engine.decrypt(&vec![0u8; MIN_ENVELOPE_LEN + 9], &bob),
            Err(Error::DecryptionFailure)
        );
    }

    #[test]
    fn test_truncated_envelope_fails() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();
        let envelope = seal(b"hello", &alice, &bob);

        let engine = DecryptionEngine::default();
        assert!(engine.decrypt(&envelope[..envelope.len() - 1], &bob).is_err());
        assert!(engine.decrypt(&envelope[..HEADER_LEN], &bob).is_err());
    }

    #[test]
    fn test_unknown_version_fails() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();
        let mut envelope = seal(b"hello", &alice, &bob);
        envelope[0] = 0x02;

        assert_eq!(
            DecryptionEngine::default().decrypt(&envelope, &bob),
            Err(Error::DecryptionFailure)
        );
    }

    #[test]
    fn test_low_order_ephemeral_fails() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();
        let mut envelope = seal(b"hello", &alice, &bob);
        envelope[1 + PUBLIC_KEY_SIZE..AAD_LEN].fill(0);

        assert_eq!(
            DecryptionEngine::default().decrypt(&envelope, &bob),
            Err(Error::DecryptionFailure)
        );
    }

    #[test]
    fn test_failures_are_indistinguishable() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();
        let eve = IdentityKeyPair::generate();
        let engine = DecryptionEngine::default();

        let envelope = seal(b"hello", &alice, &bob);
        let mut tampered = envelope.clone();
        tampered[HEADER_LEN] ^= 0x80;

        let errors = [
            engine.decrypt(&[], &bob).unwrap_err(),
            engine.decrypt(&envelope, &eve).unwrap_err(),
            engine.decrypt(&tampered, &bob).unwrap_err(),
        ];

        for err in &errors {
            assert_eq!(err, &Error::DecryptionFailure);
            assert_eq!(err.to_string(), errors[0].to_string());
        }
    }
}
