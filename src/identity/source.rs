//! Where the local identity secret lives between runs.
//!
//! The core never touches disk or a platform keystore itself. Hosts plug one
//! in by implementing [`IdentitySource`].

use parking_lot::RwLock;
use zeroize::Zeroizing;

use crate::crypto::SECRET_KEY_SIZE;
use crate::error::Result;

/// Storage hook for the local X25519 secret
///
/// Any error returned here is fatal for initialization and surfaces as
/// [`Error::IdentityUnavailable`](crate::Error::IdentityUnavailable).
pub trait IdentitySource: Send + Sync {
    /// Return the stored secret, or `None` if no identity exists yet
    fn load(&self) -> Result<Option<Zeroizing<[u8; SECRET_KEY_SIZE]>>>;

    /// Store a freshly generated secret
    fn persist(&self, secret: &[u8; SECRET_KEY_SIZE]) -> Result<()>;
}

/// Keeps the secret in memory for the life of the process
///
/// Useful for tests and for hosts that manage storage elsewhere and seed
/// the secret with [`with_secret`](Self::with_secret).
#[derive(Default)]
pub struct MemoryIdentitySource {
    slot: RwLock<Option<Zeroizing<[u8; SECRET_KEY_SIZE]>>>,
}

impl MemoryIdentitySource {
    /// Create an empty source; the first initialization generates a key
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source pre-seeded with an existing secret
    pub fn with_secret(secret: [u8; SECRET_KEY_SIZE]) -> Self {
        Self {
            slot: RwLock::new(Some(Zeroizing::new(secret))),
        }
    }

    /// Whether a secret is currently stored
    pub fn is_populated(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl IdentitySource for MemoryIdentitySource {
    fn load(&self) -> Result<Option<Zeroizing<[u8; SECRET_KEY_SIZE]>>> {
        Ok(self.slot.read().clone())
    }

    fn persist(&self, secret: &[u8; SECRET_KEY_SIZE]) -> Result<()> {
        *self.slot.write() = Some(Zeroizing::new(*secret));
        Ok(())
    }
}

/// Never stores anything; every initialization yields a new identity
#[derive(Debug, Default, Clone, Copy)]
pub struct EphemeralIdentitySource;

impl IdentitySource for EphemeralIdentitySource {
    fn load(&self) -> Result<Option<Zeroizing<[u8; SECRET_KEY_SIZE]>>> {
        Ok(None)
    }

    fn persist(&self, _secret: &[u8; SECRET_KEY_SIZE]) -> Result<()> {
        Ok(())
    }
}
