//! # Party Registry
//!
//! The set of correspondents the local user can encrypt to, keyed by a
//! user-chosen identifier.
//!
//! ## Mutation Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      REGISTRY MUTATIONS                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  add / update / rename / restore                                       │
//! │                                                                         │
//! │  ┌──────────────────────┐     ┌───────────────────────────────────┐    │
//! │  │ Outside the lock     │     │ Under ONE write lock              │    │
//! │  │                      │     │                                   │    │
//! │  │ • validate id        │ ──► │ • existence / uniqueness checks   │    │
//! │  │ • decode + validate  │     │ • commit (insert/remove/replace)  │    │
//! │  │   the key text       │     │ • broadcast RegistryEvent         │    │
//! │  └──────────────────────┘     └───────────────────────────────────┘    │
//! │                                                                         │
//! │  Any failure returns before the commit, so the map is never left       │
//! │  half-updated. Readers see either the old state or the new state.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Observing Changes
//!
//! ```ignore
//! let mut events = registry.subscribe();
//! registry.add("alice", &alice_key_text)?;
//! assert_eq!(
//!     events.try_recv()?,
//!     RegistryEvent::Added { identifier: "alice".into() }
//! );
//! ```
//!
//! Events are sent while the write lock is held, so subscribers observe
//! them in commit order.

mod party;
mod snapshot;

pub use party::Party;
pub use snapshot::{RegistrySnapshot, SnapshotEntry, SNAPSHOT_VERSION};

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::codec;
use crate::crypto::PublicKey;
use crate::error::{Error, Result};
use party::validate_identifier;

/// Default buffer size of the registry event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A committed change to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A new party was registered
    Added {
        /// Identifier of the new party
        identifier: String,
    },
    /// A party's key was replaced
    Updated {
        /// Identifier of the updated party
        identifier: String,
    },
    /// A party moved to a new identifier
    Renamed {
        /// Previous identifier
        from: String,
        /// New identifier
        to: String,
    },
    /// A party was deleted
    Removed {
        /// Identifier of the removed party
        identifier: String,
    },
    /// The whole registry was replaced from a snapshot
    Restored {
        /// Number of parties now registered
        count: usize,
    },
}

/// Thread-safe store of registered parties
pub struct PartyRegistry {
    parties: RwLock<HashMap<String, Party>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl Default for PartyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PartyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartyRegistry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl PartyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create an empty registry whose event channel buffers `capacity` events
    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            parties: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Subscribe to registry change events
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Register a new party
    ///
    /// ## Errors
    ///
    /// - `InvalidIdentifier` if the identifier is empty or blank
    /// - `InvalidKeyFormat` if the key text does not decode
    /// - `DuplicateIdentifier` if the identifier is already registered
    pub fn add(&self, identifier: &str, key_text: &str) -> Result<Party> {
        validate_identifier(identifier)?;
        let public_key = codec::decode_key(key_text)?;

        let mut parties = self.parties.write();
        if parties.contains_key(identifier) {
            return Err(Error::DuplicateIdentifier(identifier.to_string()));
        }

        warn_if_shared(&parties, &public_key, identifier, &[]);

        let party = Party::new(identifier.to_string(), public_key);
        parties.insert(identifier.to_string(), party.clone());
        self.notify(RegistryEvent::Added {
            identifier: identifier.to_string(),
        });

        tracing::info!("Added party {} ({})", identifier, party.fingerprint());
        Ok(party)
    }

    /// Replace the key of an existing party
    ///
    /// The key is decoded before the registry is touched; on any error the
    /// existing entry is unchanged.
    pub fn update(&self, identifier: &str, key_text: &str) -> Result<Party> {
        let public_key = codec::decode_key(key_text)?;
        self.replace_key(identifier, public_key)
    }

    /// Move a party to a new identifier and key in one step
    ///
    /// Other threads see either `old` or `new`, never both and never
    /// neither. Renaming to the same identifier is an [`update`](Self::update).
    ///
    /// ## Errors
    ///
    /// Checked in this order, with nothing changed on failure:
    /// 1. `InvalidIdentifier` for a blank `new`
    /// 2. `InvalidKeyFormat` for bad key text
    /// 3. `PartyNotFound` if `old` is not registered
    /// 4. `DuplicateIdentifier` if `new` belongs to another party
    pub fn rename(&self, old: &str, new: &str, key_text: &str) -> Result<Party> {
        validate_identifier(new)?;
        let public_key = codec::decode_key(key_text)?;

        if old == new {
            return self.replace_key(old, public_key);
        }

        let mut parties = self.parties.write();
        let existing = parties
            .get(old)
            .ok_or_else(|| Error::PartyNotFound(old.to_string()))?;
        if parties.contains_key(new) {
            return Err(Error::DuplicateIdentifier(new.to_string()));
        }

        let renamed = existing.revised(new.to_string(), public_key);
        warn_if_shared(&parties, &public_key, new, &[old]);

        parties.remove(old);
        parties.insert(new.to_string(), renamed.clone());
        self.notify(RegistryEvent::Renamed {
            from: old.to_string(),
            to: new.to_string(),
        });

        tracing::info!("Renamed party {} to {} ({})", old, new, renamed.fingerprint());
        Ok(renamed)
    }

    /// Delete a party
    ///
    /// Returns whether anything was removed. Removing an unknown identifier
    /// is a no-op.
    pub fn remove(&self, identifier: &str) -> bool {
        let mut parties = self.parties.write();
        if parties.remove(identifier).is_none() {
            return false;
        }

        self.notify(RegistryEvent::Removed {
            identifier: identifier.to_string(),
        });
        tracing::info!("Removed party {}", identifier);
        true
    }

    fn replace_key(&self, identifier: &str, public_key: PublicKey) -> Result<Party> {
        let mut parties = self.parties.write();
        let existing = parties
            .get(identifier)
            .ok_or_else(|| Error::PartyNotFound(identifier.to_string()))?;

        let updated = existing.revised(identifier.to_string(), public_key);
        warn_if_shared(&parties, &public_key, identifier, &[]);

        parties.insert(identifier.to_string(), updated.clone());
        self.notify(RegistryEvent::Updated {
            identifier: identifier.to_string(),
        });

        tracing::info!("Updated key for party {} ({})", identifier, updated.fingerprint());
        Ok(updated)
    }

    fn notify(&self, event: RegistryEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Get a party by identifier
    pub fn lookup(&self, identifier: &str) -> Option<Party> {
        self.parties.read().get(identifier).cloned()
    }

    /// Whether a party is registered under `identifier`
    pub fn contains(&self, identifier: &str) -> bool {
        self.parties.read().contains_key(identifier)
    }

    /// All parties, sorted by identifier
    ///
    /// The returned list is a copy; later mutations do not affect it.
    pub fn all(&self) -> Vec<Party> {
        let mut parties: Vec<Party> = self.parties.read().values().cloned().collect();
        parties.sort_by(|a, b| a.identifier().cmp(b.identifier()));
        parties
    }

    /// Number of registered parties
    pub fn len(&self) -> usize {
        self.parties.read().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.parties.read().is_empty()
    }

    /// Find the party holding `key`
    ///
    /// If several identifiers share the key, the first in identifier order
    /// is returned.
    pub fn find_by_key(&self, key: &PublicKey) -> Option<Party> {
        self.parties
            .read()
            .values()
            .filter(|party| party.public_key() == key)
            .min_by(|a, b| a.identifier().cmp(b.identifier()))
            .cloned()
    }

    // ========================================================================
    // PERSISTENCE HOOKS
    // ========================================================================

    /// Copy the registry into a serializable snapshot
    pub fn snapshot(&self) -> RegistrySnapshot {
        let parties = self
            .all()
            .into_iter()
            .map(|party| SnapshotEntry {
                identifier: party.identifier().to_string(),
                public_key: codec::encode_key(party.public_key()),
                added_at: party.added_at(),
                updated_at: party.updated_at(),
            })
            .collect();

        RegistrySnapshot {
            version: SNAPSHOT_VERSION,
            parties,
        }
    }

    /// Replace the whole registry with the contents of `snapshot`
    ///
    /// Every entry is validated before anything changes. A single bad entry
    /// fails the restore and leaves the current contents in place.
    /// Returns the number of parties restored.
    pub fn restore(&self, snapshot: &RegistrySnapshot) -> Result<usize> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::DeserializationError(format!(
                "unsupported registry snapshot version {}",
                snapshot.version
            )));
        }

        let mut restored = HashMap::with_capacity(snapshot.parties.len());
        for entry in &snapshot.parties {
            validate_identifier(&entry.identifier)?;
            let public_key = codec::decode_key(&entry.public_key)?;
            if restored.contains_key(&entry.identifier) {
                return Err(Error::DuplicateIdentifier(entry.identifier.clone()));
            }
            restored.insert(
                entry.identifier.clone(),
                Party::from_parts(
                    entry.identifier.clone(),
                    public_key,
                    entry.added_at,
                    entry.updated_at,
                ),
            );
        }

        let count = restored.len();
        let mut parties = self.parties.write();
        *parties = restored;
        self.notify(RegistryEvent::Restored { count });

        tracing::info!("Restored {} parties from snapshot", count);
        Ok(count)
    }
}

/// Log when `key` is already held by an identifier other than `identifier`
/// (or those in `ignore`). Sharing a key is allowed but usually a mistake.
fn warn_if_shared(
    parties: &HashMap<String, Party>,
    key: &PublicKey,
    identifier: &str,
    ignore: &[&str],
) {
    let holder = parties
        .values()
        .filter(|party| party.public_key() == key)
        .map(Party::identifier)
        .find(|id| *id != identifier && !ignore.contains(id));

    if let Some(holder) = holder {
        tracing::warn!(
            "Party {} uses the same key as {} ({})",
            identifier,
            holder,
            key.fingerprint()
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
