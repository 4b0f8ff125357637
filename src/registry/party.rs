//! Registered parties.

use serde::Serialize;

use crate::crypto::PublicKey;
use crate::error::{Error, Result};

/// A named correspondent bound to one validated public key
///
/// Only the registry constructs parties, and only after the identifier and
/// key have both been validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Party {
    identifier: String,
    public_key: PublicKey,
    added_at: i64,
    updated_at: i64,
}

impl Party {
    pub(crate) fn new(identifier: String, public_key: PublicKey) -> Self {
        let now = now_timestamp();
        Self {
            identifier,
            public_key,
            added_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn from_parts(
        identifier: String,
        public_key: PublicKey,
        added_at: i64,
        updated_at: i64,
    ) -> Self {
        Self {
            identifier,
            public_key,
            added_at,
            updated_at,
        }
    }

    /// Same party under a (possibly) new identifier and key, keeping `added_at`
    pub(crate) fn revised(&self, identifier: String, public_key: PublicKey) -> Self {
        Self {
            identifier,
            public_key,
            added_at: self.added_at,
            updated_at: now_timestamp().max(self.updated_at),
        }
    }

    /// The identifier exactly as registered
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The party's public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// When the party was first registered (Unix seconds)
    pub fn added_at(&self) -> i64 {
        self.added_at
    }

    /// When the key or identifier last changed (Unix seconds)
    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    /// Fingerprint of the party's key, for out-of-band comparison
    pub fn fingerprint(&self) -> String {
        self.public_key.fingerprint()
    }
}

/// Reject identifiers that are empty or only whitespace.
///
/// Identifiers are otherwise stored verbatim and compared case-sensitively.
pub(crate) fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() {
        return Err(Error::InvalidIdentifier(
            "identifier must not be empty or blank".into(),
        ));
    }
    Ok(())
}

fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
