//! Sealing plaintext for a recipient.

use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey};

use super::{envelope_len, DEFAULT_MAX_PLAINTEXT_LEN, ENVELOPE_VERSION};
use crate::crypto::{self, IdentityKeyPair, PublicKey};
use crate::error::{Error, Result};

/// Produces envelopes addressed to a single recipient key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionEngine {
    max_plaintext_len: usize,
}

impl Default for EncryptionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PLAINTEXT_LEN)
    }
}

impl EncryptionEngine {
    /// Create an engine that refuses plaintexts above `max_plaintext_len`
    pub fn new(max_plaintext_len: usize) -> Self {
        Self { max_plaintext_len }
    }

    /// The largest plaintext this engine will seal
    pub fn max_plaintext_len(&self) -> usize {
        self.max_plaintext_len
    }

    /// Seal `plaintext` so that only `recipient` can open it
    ///
    /// The envelope also carries `sender`'s public key, authenticated by a
    /// static-static agreement, so the recipient learns who sent it.
    ///
    /// ## Errors
    ///
    /// `EncryptionFailure` if the plaintext exceeds the configured limit.
    /// Messages are never split; callers must keep them under the limit.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        recipient: &PublicKey,
        sender: &IdentityKeyPair,
    ) -> Result<Vec<u8>> {
        if plaintext.len() > self.max_plaintext_len {
            return Err(Error::EncryptionFailure(format!(
                "message is {} bytes; the limit is {} bytes",
                plaintext.len(),
                self.max_plaintext_len
            )));
        }

        let recipient_point = recipient.to_x25519();
        let ephemeral = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_public = X25519PublicKey::from(&ephemeral);

        let static_dh = sender.agree(&recipient_point);
        let ephemeral_dh = ephemeral.diffie_hellman(&recipient_point);
        // Unreachable for validated keys
        if !ephemeral_dh.was_contributory() || !static_dh.was_contributory() {
            return Err(Error::EncryptionFailure(
                "key agreement with the recipient key was degenerate".into(),
            ));
        }

        let key = crypto::derive_envelope_key(
            ephemeral_dh.as_bytes(),
            static_dh.as_bytes(),
            ephemeral_public.as_bytes(),
            recipient.as_bytes(),
        )?;

        let mut envelope = Vec::with_capacity(envelope_len(plaintext.len()));
        envelope.push(ENVELOPE_VERSION);
        envelope.extend_from_slice(sender.public_key().as_bytes());
        envelope.extend_from_slice(ephemeral_public.as_bytes());

        let (nonce, sealed) = crypto::encrypt(&key, plaintext, &envelope)?;
        envelope.extend_from_slice(nonce.as_bytes());
        envelope.extend_from_slice(&sealed);

        tracing::debug!(
            plaintext_len = plaintext.len(),
            envelope_len = envelope.len(),
            "Sealed envelope for {}",
            recipient.fingerprint()
        );

        Ok(envelope)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AAD_LEN, MIN_ENVELOPE_LEN};

    #[test]
    fn test_envelope_shape() {
        let sender = IdentityKeyPair::generate();
        let recipient = IdentityKeyPair::generate();

        let envelope = EncryptionEngine::default()
            .encrypt(b"hello", recipient.public_key(), &sender)
            .unwrap();

        assert_eq!(envelope.len(), MIN_ENVELOPE_LEN + 5);
        assert_eq!(envelope[0], ENVELOPE_VERSION);
        assert_eq!(&envelope[1..33], sender.public_key().as_bytes());
        assert_ne!(&envelope[33..AAD_LEN], recipient.public_key().as_bytes());
    }

    #[test]
    fn test_empty_plaintext_allowed() {
        let sender = IdentityKeyPair::generate();
        let recipient = IdentityKeyPair::generate();

        let envelope = EncryptionEngine::default()
            .encrypt(b"", recipient.public_key(), &sender)
            .unwrap();

        assert_eq!(envelope.len(), MIN_ENVELOPE_LEN);
    }

    #[test]
    fn test_output_is_randomized() {
        let sender = IdentityKeyPair::generate();
        let recipient = IdentityKeyPair::generate();
        let engine = EncryptionEngine::default();

        let a = engine.encrypt(b"same", recipient.public_key(), &sender).unwrap();
        let b = engine.encrypt(b"same", recipient.public_key(), &sender).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_limit_enforced() {
        let sender = IdentityKeyPair::generate();
        let recipient = IdentityKeyPair::generate();
        let engine = EncryptionEngine::new(16);

        assert!(engine.encrypt(&[0u8; 16], recipient.public_key(), &sender).is_ok());

        let err = engine
            .encrypt(&[0u8; 17], recipient.public_key(), &sender)
            .unwrap_err();
        assert!(matches!(err, Error::EncryptionFailure(_)));
        assert!(err.to_string().contains("17"));
    }
}
