//! # Identity Module
//!
//! Owns the local user's key pair.
//!
//! ## Initialization
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    IDENTITY INITIALIZATION                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │                     source.load()                                       │
//! │                          │                                              │
//! │          ┌───────────────┼────────────────┐                             │
//! │          ▼               ▼                ▼                             │
//! │    Some(secret)        None             Err(_)                          │
//! │          │               │                │                             │
//! │          ▼               ▼                │                             │
//! │   rebuild key pair   generate (OsRng)     │                             │
//! │          │               │                │                             │
//! │          │          source.persist() ─────┤ Err(_)                      │
//! │          │               │                ▼                             │
//! │          ▼               ▼        IdentityUnavailable (fatal)          │
//! │     IdentityManager (immutable, shared behind Arc)                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no degraded mode: without a key pair the application cannot
//! decrypt anything addressed to it, so initialization either fully succeeds
//! or reports a fatal error.

mod source;

pub use source::{EphemeralIdentitySource, IdentitySource, MemoryIdentitySource};

use crate::codec;
use crate::crypto::{IdentityKeyPair, PublicKey};
use crate::error::{Error, Result};

/// How the local key pair came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOrigin {
    /// Rebuilt from a secret held by the identity source
    Loaded,
    /// Freshly generated during this initialization
    Generated,
}

/// Holder of the local identity
#[derive(Debug)]
pub struct IdentityManager {
    key_pair: IdentityKeyPair,
    public_text: String,
    origin: IdentityOrigin,
}

impl IdentityManager {
    /// Load the identity from `source`, generating and persisting one if
    /// none exists
    ///
    /// ## Errors
    ///
    /// `IdentityUnavailable` if the source fails to load or persist, or the
    /// stored secret is unusable.
    pub fn initialize(source: &dyn IdentitySource) -> Result<Self> {
        let stored = source
            .load()
            .map_err(|e| unavailable("could not load stored identity", e))?;

        let (key_pair, origin) = match stored {
            Some(secret) => {
                let key_pair = IdentityKeyPair::from_secret_bytes(&secret)
                    .map_err(|e| unavailable("stored identity is corrupt", e))?;
                (key_pair, IdentityOrigin::Loaded)
            }
            None => {
                let key_pair = IdentityKeyPair::generate();
                source
                    .persist(&key_pair.secret_bytes())
                    .map_err(|e| unavailable("could not persist new identity", e))?;
                (key_pair, IdentityOrigin::Generated)
            }
        };

        let manager = Self::assemble(key_pair, origin);
        tracing::info!(
            "Local identity {:?}: {}",
            manager.origin,
            manager.fingerprint()
        );
        Ok(manager)
    }

    /// Wrap an existing key pair without consulting any source
    pub fn from_key_pair(key_pair: IdentityKeyPair) -> Self {
        Self::assemble(key_pair, IdentityOrigin::Loaded)
    }

    fn assemble(key_pair: IdentityKeyPair, origin: IdentityOrigin) -> Self {
        let public_text = codec::encode_key(key_pair.public_key());
        Self {
            key_pair,
            public_text,
            origin,
        }
    }

    /// The local public key in its shareable text form
    pub fn local_public_key(&self) -> String {
        self.public_text.clone()
    }

    /// The local public key
    pub fn public_key(&self) -> &PublicKey {
        self.key_pair.public_key()
    }

    /// Fingerprint of the local key
    pub fn fingerprint(&self) -> String {
        self.key_pair.public_key().fingerprint()
    }

    /// Whether the key pair was loaded or generated
    pub fn origin(&self) -> IdentityOrigin {
        self.origin
    }

    pub(crate) fn key_pair(&self) -> &IdentityKeyPair {
        &self.key_pair
    }
}

fn unavailable(context: &str, err: Error) -> Error {
    match err {
        Error::IdentityUnavailable(reason) => {
            Error::IdentityUnavailable(format!("{}: {}", context, reason))
        }
        other => Error::IdentityUnavailable(format!("{}: {}", context, other)),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SECRET_KEY_SIZE;
    use zeroize::Zeroizing;

    struct BrokenSource {
        fail_load: bool,
    }

    impl IdentitySource for BrokenSource {
        fn load(&self) -> Result<Option<Zeroizing<[u8; SECRET_KEY_SIZE]>>> {
            if self.fail_load {
                Err(Error::IdentityUnavailable("keystore locked".into()))
            } else {
                Ok(None)
            }
        }

        fn persist(&self, _secret: &[u8; SECRET_KEY_SIZE]) -> Result<()> {
            Err(Error::SerializationError("disk full".into()))
        }
    }

    #[test]
    fn test_generate_then_load() {
        let source = MemoryIdentitySource::new();

        let first = IdentityManager::initialize(&source).unwrap();
        assert_eq!(first.origin(), IdentityOrigin::Generated);
        assert!(source.is_populated());

        let second = IdentityManager::initialize(&source).unwrap();
        assert_eq!(second.origin(), IdentityOrigin::Loaded);
        assert_eq!(first.local_public_key(), second.local_public_key());
    }

    #[test]
    fn test_seeded_source() {
        let expected = IdentityKeyPair::from_secret_bytes(&[5u8; 32]).unwrap();
        let source = MemoryIdentitySource::with_secret([5u8; 32]);

        let manager = IdentityManager::initialize(&source).unwrap();
        assert_eq!(manager.public_key(), expected.public_key());
        assert_eq!(manager.fingerprint(), expected.public_key().fingerprint());
    }

    #[test]
    fn test_ephemeral_source_generates_each_time() {
        let a = IdentityManager::initialize(&EphemeralIdentitySource).unwrap();
        let b = IdentityManager::initialize(&EphemeralIdentitySource).unwrap();

        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_public_key_text_is_decodable() {
        let manager = IdentityManager::initialize(&EphemeralIdentitySource).unwrap();
        let text = manager.local_public_key();

        assert_eq!(codec::decode_key(&text).unwrap(), *manager.public_key());
        assert_eq!(text, manager.local_public_key());
    }

    #[test]
    fn test_load_failure_is_fatal() {
        let err = IdentityManager::initialize(&BrokenSource { fail_load: true }).unwrap_err();

        assert!(matches!(err, Error::IdentityUnavailable(_)));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("keystore locked"));
    }

    #[test]
    fn test_persist_failure_is_fatal() {
        let err = IdentityManager::initialize(&BrokenSource { fail_load: false }).unwrap_err();

        assert!(matches!(err, Error::IdentityUnavailable(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
