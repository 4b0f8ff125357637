//! Serializable registry snapshots.
//!
//! The registry keeps nothing on disk. Collaborators persist a
//! [`RegistrySnapshot`] however they like and hand it back through
//! [`PartyRegistry::restore`](super::PartyRegistry::restore).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full copy of the registry contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Format version
    pub version: u32,
    /// Parties in identifier order
    pub parties: Vec<SnapshotEntry>,
}

/// One party in a snapshot
///
/// The key is kept as text and re-validated on restore, so a hand-edited
/// snapshot cannot smuggle in an invalid key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Party identifier
    pub identifier: String,
    /// Canonical public key text
    pub public_key: String,
    /// Unix seconds
    pub added_at: i64,
    /// Unix seconds
    pub updated_at: i64,
}

impl RegistrySnapshot {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::SerializationError(e.to_string()))
    }

    /// Deserialize from JSON
    ///
    /// Unknown versions are rejected rather than guessed at.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::DeserializationError(format!(
                "unsupported registry snapshot version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let snapshot = RegistrySnapshot {
            version: SNAPSHOT_VERSION,
            parties: vec![SnapshotEntry {
                identifier: "alice".into(),
                public_key: "AQ==".into(),
                added_at: 1,
                updated_at: 2,
            }],
        };

        let json = snapshot.to_json().unwrap();
        assert_eq!(RegistrySnapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let json = r#"{"version":2,"parties":[]}"#;
        assert!(matches!(
            RegistrySnapshot::from_json(json),
            Err(Error::DeserializationError(_))
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            RegistrySnapshot::from_json("{\"version\":1"),
            Err(Error::DeserializationError(_))
        ));
    }
}
