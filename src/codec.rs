//! # Text Codecs
//!
//! Conversions between the text users paste into the UI and the validated
//! types the core works with.
//!
//! ## Key Text Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PUBLIC KEY TEXT                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   base64-standard( tag (1 byte) || key (32 bytes) )  → 44 characters   │
//! │                                                                         │
//! │   tag 0x01 = X25519                                                    │
//! │                                                                         │
//! │   Decoding pipeline (first failure wins):                              │
//! │   ┌──────────────┐   ┌────────────┐   ┌────────┐   ┌───────────────┐   │
//! │   │ length ≤ 512 │ → │ strip ws   │ → │ base64 │ → │ 33 bytes, tag │   │
//! │   └──────────────┘   │ non-empty  │   └────────┘   └───────┬───────┘   │
//! │                      └────────────┘                        ▼           │
//! │                                        ┌─────────────────────────────┐ │
//! │                                        │ canonical, not low-order    │ │
//! │                                        └─────────────────────────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Whitespace anywhere in the text is ignored so keys that were word-wrapped
//! by a mail client or chat window still decode.
//!
//! ## Ciphertext Text Format
//!
//! Envelopes travel as plain standard base64. Decoding failures surface as
//! [`Error::DecryptionFailure`] so that a garbled paste and a tampered
//! envelope look the same to the user.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::crypto::{PublicKey, KEY_ALGORITHM_X25519, PUBLIC_KEY_SIZE};
use crate::engine::{MIN_ENVELOPE_LEN, DEFAULT_MAX_PLAINTEXT_LEN};
use crate::error::{Error, Result};

/// Longest key text accepted before any decoding is attempted
pub const MAX_KEY_TEXT_LEN: usize = 512;

/// Decoded length of a key: tag byte plus key bytes
pub const ENCODED_KEY_LEN: usize = 1 + PUBLIC_KEY_SIZE;

/// Decode a public key from its text form
///
/// ## Errors
///
/// `InvalidKeyFormat` with a reason describing the first check that failed.
///
/// ## Example
///
/// ```
/// use courier_core::codec::{decode_key, encode_key};
/// use courier_core::crypto::IdentityKeyPair;
///
/// let key = *IdentityKeyPair::generate().public_key();
/// let text = encode_key(&key);
/// assert_eq!(decode_key(&text).unwrap(), key);
/// ```
pub fn decode_key(text: &str) -> Result<PublicKey> {
    if text.len() > MAX_KEY_TEXT_LEN {
        return Err(Error::InvalidKeyFormat(format!(
            "key text is {} bytes; at most {} are accepted",
            text.len(),
            MAX_KEY_TEXT_LEN
        )));
    }

    let compact = strip_whitespace(text);
    if compact.is_empty() {
        return Err(Error::InvalidKeyFormat("key text is empty".into()));
    }

    let raw = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::InvalidKeyFormat(format!("key text is not valid base64: {}", e)))?;

    if raw.len() != ENCODED_KEY_LEN {
        return Err(Error::InvalidKeyFormat(format!(
            "key decodes to {} bytes; expected {}",
            raw.len(),
            ENCODED_KEY_LEN
        )));
    }

    if raw[0] != KEY_ALGORITHM_X25519 {
        return Err(Error::InvalidKeyFormat(format!(
            "unsupported key algorithm tag 0x{:02x}",
            raw[0]
        )));
    }

    let mut bytes = [0u8; PUBLIC_KEY_SIZE];
    bytes.copy_from_slice(&raw[1..]);
    PublicKey::from_bytes(bytes)
}

/// Encode a public key in its canonical text form
pub fn encode_key(key: &PublicKey) -> String {
    let mut raw = [0u8; ENCODED_KEY_LEN];
    raw[0] = key.algorithm();
    raw[1..].copy_from_slice(key.as_bytes());
    STANDARD.encode(raw)
}

/// Encode an envelope for transport as text
pub fn encode_ciphertext(envelope: &[u8]) -> String {
    STANDARD.encode(envelope)
}

/// Decode envelope text, sized for the default plaintext limit
///
/// See [`decode_ciphertext_with_limit`].
pub fn decode_ciphertext(text: &str) -> Result<Vec<u8>> {
    decode_ciphertext_with_limit(text, MIN_ENVELOPE_LEN + DEFAULT_MAX_PLAINTEXT_LEN)
}

/// Decode envelope text, refusing anything that would exceed `max_envelope_len`
///
/// Every failure is [`Error::DecryptionFailure`].
pub fn decode_ciphertext_with_limit(text: &str, max_envelope_len: usize) -> Result<Vec<u8>> {
    let compact = strip_whitespace(text);
    if compact.is_empty() {
        return Err(Error::DecryptionFailure);
    }

    // No text bound when the encoded limit overflows usize
    if let Some(limit) = base64::encoded_len(max_envelope_len, true) {
        if compact.len() > limit {
            return Err(Error::DecryptionFailure);
        }
    }

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| Error::DecryptionFailure)
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::IdentityKeyPair;

    fn sample_key() -> PublicKey {
        *IdentityKeyPair::from_secret_bytes(&[3u8; 32])
            .unwrap()
            .public_key()
    }

    fn assert_invalid(text: &str) {
        assert!(
            matches!(decode_key(text), Err(Error::InvalidKeyFormat(_))),
            "expected InvalidKeyFormat for {:?}",
            text
        );
    }

    #[test]
    fn test_key_round_trip() {
        for _ in 0..8 {
            let key = *IdentityKeyPair::generate().public_key();
            assert_eq!(decode_key(&encode_key(&key)).unwrap(), key);
        }
    }

    #[test]
    fn test_encoding_is_canonical() {
        let key = sample_key();
        let text = encode_key(&key);

        assert_eq!(text.len(), 44);
        assert_eq!(text, encode_key(&key));
        assert!(!text.chars().any(|c| c.is_whitespace()));
        assert_eq!(key.to_string(), text);
        assert_eq!(text.parse::<PublicKey>().unwrap(), key);
    }

    #[test]
    fn test_whitespace_is_ignored() {
        let key = sample_key();
        let text = encode_key(&key);
        let wrapped = format!("  {}\n{}\r\n\t{}  ", &text[..10], &text[10..30], &text[30..]);

        assert_eq!(decode_key(&wrapped).unwrap(), key);
    }

    #[test]
    fn test_empty_rejected() {
        assert_invalid("");
        assert_invalid("   \n\t ");
    }

    #[test]
    fn test_garbage_rejected() {
        assert_invalid("not-base64-garbage");
        assert_invalid("@@@@");
    }

    #[test]
    fn test_truncated_key_rejected() {
        let text = encode_key(&sample_key());
        assert_invalid(&text[..40]);
        // Valid base64, but only 30 bytes
        assert_invalid(&STANDARD.encode([1u8; 30]));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut raw = [0u8; ENCODED_KEY_LEN];
        raw[0] = 0x02;
        raw[1..].copy_from_slice(sample_key().as_bytes());

        let err = decode_key(&STANDARD.encode(raw)).unwrap_err();
        assert!(err.to_string().contains("0x02"));
    }

    #[test]
    fn test_low_order_keys_rejected() {
        let mut raw = [0u8; ENCODED_KEY_LEN];
        raw[0] = KEY_ALGORITHM_X25519;
        assert_invalid(&STANDARD.encode(raw));

        raw[1] = 1;
        assert_invalid(&STANDARD.encode(raw));
    }

    #[test]
    fn test_non_canonical_key_rejected() {
        let mut raw = [0xffu8; ENCODED_KEY_LEN];
        raw[0] = KEY_ALGORITHM_X25519;
        assert_invalid(&STANDARD.encode(raw));
    }

    #[test]
    fn test_oversized_input_rejected() {
        let huge = "A".repeat(MAX_KEY_TEXT_LEN + 1);
        let err = decode_key(&huge).unwrap_err();
        assert!(err.to_string().contains("at most"));

        // Padding with whitespace still counts against the limit
        let padded = format!("{}{}", encode_key(&sample_key()), " ".repeat(MAX_KEY_TEXT_LEN));
        assert_invalid(&padded);
    }

    #[test]
    fn test_ciphertext_text() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        let text = encode_ciphertext(&bytes);

        assert_eq!(decode_ciphertext(&text).unwrap(), bytes);
        assert_eq!(
            decode_ciphertext(&format!("{}\n{}", &text[..40], &text[40..])).unwrap(),
            bytes
        );
    }

    #[test]
    fn test_bad_ciphertext_text() {
        assert_eq!(decode_ciphertext(""), Err(Error::DecryptionFailure));
        assert_eq!(decode_ciphertext("%%%"), Err(Error::DecryptionFailure));
        assert_eq!(
            decode_ciphertext_with_limit(&encode_ciphertext(&[0u8; 200]), 100),
            Err(Error::DecryptionFailure)
        );
    }

    #[test]
    fn test_unbounded_ciphertext_limit() {
        let bytes = vec![7u8; 300];
        let text = encode_ciphertext(&bytes);

        assert_eq!(decode_ciphertext_with_limit(&text, usize::MAX).unwrap(), bytes);
        assert_eq!(
            decode_ciphertext_with_limit("%%%", usize::MAX),
            Err(Error::DecryptionFailure)
        );
    }
}
