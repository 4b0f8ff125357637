//! # Key Management
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY TYPES                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  PublicKey (X25519)                                             │   │
//! │  │  ──────────────────                                              │   │
//! │  │                                                                  │   │
//! │  │  Only constructed through validation:                           │   │
//! │  │  • Field element must be canonical (u < 2^255 - 19)             │   │
//! │  │  • Point must not have small order (DH must be contributory)   │   │
//! │  │                                                                  │   │
//! │  │  Text form: base64([0x01] || 32 key bytes), see `codec`         │   │
//! │  │                                                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  IdentityKeyPair (X25519)                                       │   │
//! │  │  ────────────────────────                                        │   │
//! │  │                                                                  │   │
//! │  │  • Private key: 32 bytes (kept secret, zeroized on drop)       │   │
//! │  │  • Public key: validated PublicKey, shared with parties         │   │
//! │  │                                                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, SharedSecret as DhOutput, StaticSecret};
use zeroize::{Zeroizing, ZeroizeOnDrop};

use super::{PUBLIC_KEY_SIZE, SECRET_KEY_SIZE};
use crate::error::{Error, Result};

/// Algorithm tag prepended to X25519 keys in their text form
pub const KEY_ALGORITHM_X25519: u8 = 0x01;

/// Fixed scalar used to test whether a point has small order.
///
/// Clamping makes every X25519 scalar a multiple of the cofactor, so any
/// low-order point maps to the identity regardless of the scalar chosen.
const PROBE_SCALAR: [u8; 32] = [0x5a; 32];

/// A validated public key belonging to a party (or to the local identity)
///
/// This contains only public information and can be serialized,
/// transmitted, and stored without security concerns. It serializes as
/// its canonical text form and deserialization re-validates it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Validate raw key bytes
    ///
    /// ## Errors
    ///
    /// `InvalidKeyFormat` if the bytes are not a canonical field element or
    /// encode a low-order point.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Result<Self> {
        if !is_canonical(&bytes) {
            return Err(Error::InvalidKeyFormat(
                "key is not a canonical curve point encoding".into(),
            ));
        }

        let probe = StaticSecret::from(PROBE_SCALAR);
        if !probe
            .diffie_hellman(&X25519PublicKey::from(bytes))
            .was_contributory()
        {
            return Err(Error::InvalidKeyFormat("key is a low-order point".into()));
        }

        Ok(Self(bytes))
    }

    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Algorithm tag of this key
    pub fn algorithm(&self) -> u8 {
        KEY_ALGORITHM_X25519
    }

    /// Short human-comparable fingerprint, e.g. `3f2a 91c0 ...`
    pub fn fingerprint(&self) -> String {
        super::key_fingerprint(self.algorithm(), &self.0)
    }

    pub(crate) fn to_x25519(self) -> X25519PublicKey {
        X25519PublicKey::from(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::codec::encode_key(self))
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::codec::decode_key(s)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        crate::codec::decode_key(&value)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        crate::codec::encode_key(&key)
    }
}

/// Checks `u < 2^255 - 19` on a little-endian encoding.
fn is_canonical(bytes: &[u8; PUBLIC_KEY_SIZE]) -> bool {
    // p = 0x7fff..ffed
    match bytes[31] {
        0x80..=0xff => false,
        0x7f => bytes[1..31].iter().any(|&b| b != 0xff) || bytes[0] < 0xed,
        _ => true,
    }
}

/// The local user's X25519 key pair
///
/// ## Security
///
/// - The secret is zeroized when this struct is dropped
/// - Not `Clone`: exactly one copy lives inside the identity manager
/// - `Debug` prints only the public fingerprint
#[derive(ZeroizeOnDrop)]
pub struct IdentityKeyPair {
    /// Private key (secret)
    #[zeroize(skip)] // x25519_dalek handles its own zeroization
    secret: StaticSecret,
    /// Public key (derived from secret)
    #[zeroize(skip)]
    public: PublicKey,
}

impl IdentityKeyPair {
    /// Generate a new random key pair from the OS RNG
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey(X25519PublicKey::from(&secret).to_bytes());
        Self { secret, public }
    }

    /// Rebuild a key pair from a stored secret
    ///
    /// ## Errors
    ///
    /// `InvalidKeyFormat` if the derived public key fails validation, which
    /// only happens for corrupted stored material.
    pub fn from_secret_bytes(bytes: &[u8; SECRET_KEY_SIZE]) -> Result<Self> {
        let secret = StaticSecret::from(*bytes);
        let public = PublicKey::from_bytes(X25519PublicKey::from(&secret).to_bytes())?;
        Ok(Self { secret, public })
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Get the secret key bytes (for handing to an identity store)
    ///
    /// ## Security Warning
    ///
    /// Only use this for secure storage. Never log or transmit these bytes.
    pub(crate) fn secret_bytes(&self) -> Zeroizing<[u8; SECRET_KEY_SIZE]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    /// Perform X25519 with another public point
    ///
    /// The caller decides what to do with non-contributory output.
    pub(crate) fn agree(&self, their_public: &X25519PublicKey) -> DhOutput {
        self.secret.diffie_hellman(their_public)
    }
}

impl fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================
