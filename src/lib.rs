//! # Courier Core
//!
//! Party identity and public-key message encryption for the Courier
//! desktop client. The UI keeps a list of named correspondents, each bound
//! to a public key, and uses the core to encrypt messages for them and to
//! decrypt messages addressed to the local user.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         COURIER CORE                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   UI (party list, compose/read dialogs)                                │
//! │        │                                   ▲                            │
//! │        ▼                                   │ Result<T> / ErrorReport    │
//! │  ┌─────────────────────────────────────────┴───────────────────────┐   │
//! │  │                       CourierCore (facade)                      │   │
//! │  └───┬──────────────┬────────────────┬──────────────────┬──────────┘   │
//! │      │              │                │                  │              │
//! │      ▼              ▼                ▼                  ▼              │
//! │  ┌────────┐   ┌──────────┐   ┌──────────────┐   ┌──────────────┐      │
//! │  │ codec  │──►│ registry │   │   identity   │   │    engine    │      │
//! │  │        │   │          │   │              │   │              │      │
//! │  │ key    │   │ id → key │   │ local X25519 │   │ seal / open  │      │
//! │  │ text   │   │ events   │   │ key pair     │   │ envelopes    │      │
//! │  └────────┘   └──────────┘   └──────────────┘   └──────────────┘      │
//! │                                                         │              │
//! │                                                         ▼              │
//! │                                          ┌──────────────────────────┐  │
//! │                                          │ crypto: X25519, HKDF,    │  │
//! │                                          │ AES-256-GCM, SHA-256     │  │
//! │                                          └──────────────────────────┘  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error type, codes, and the UI-facing [`ErrorReport`]
//! - [`crypto`] - Key types and primitives
//! - [`codec`] - Public key and ciphertext text forms
//! - [`registry`] - Named parties and their keys
//! - [`identity`] - The local key pair and its storage hook
//! - [`engine`] - Envelope encryption and decryption
//!
//! ## Quick Start
//!
//! ```
//! use courier_core::{CoreConfig, CourierCore, EphemeralIdentitySource};
//!
//! let alice = CourierCore::new(CoreConfig::default(), &EphemeralIdentitySource)?;
//! let bob = CourierCore::new(CoreConfig::default(), &EphemeralIdentitySource)?;
//!
//! alice.registry().add("bob", &bob.local_public_key())?;
//! bob.registry().add("alice", &alice.local_public_key())?;
//!
//! let sealed = alice.encrypt_message("bob", "hi bob")?;
//! let received = bob.open_message(&sealed)?;
//! assert_eq!(received.text, "hi bob");
//! assert_eq!(received.sender.as_deref(), Some("alice"));
//! # Ok::<(), courier_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod codec;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod identity;
pub mod registry;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use crypto::{IdentityKeyPair, PublicKey};
pub use engine::{DecryptionEngine, EncryptionEngine, OpenedMessage};
pub use error::{Error, ErrorReport, InputField, Result};
pub use identity::{EphemeralIdentitySource, IdentityManager, IdentitySource, MemoryIdentitySource};
pub use registry::{Party, PartyRegistry, RegistryEvent, RegistrySnapshot};

// ============================================================================
// CONFIGURATION
// ============================================================================

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroize;

/// Configuration for Courier Core
///
/// Missing fields take their defaults when parsed from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Largest plaintext accepted for encryption, in bytes
    pub max_plaintext_len: usize,
    /// Buffer size of the registry event channel
    pub event_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_plaintext_len: engine::DEFAULT_MAX_PLAINTEXT_LEN,
            event_capacity: registry::DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CoreConfig {
    /// Parse and validate a JSON configuration
    ///
    /// The document must be a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(Error::DeserializationError(
                "configuration must be a JSON object".into(),
            ));
        }

        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the core cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_plaintext_len == 0 {
            return Err(Error::InvalidConfig(
                "max_plaintext_len must be greater than zero".into(),
            ));
        }
        if self.max_plaintext_len > engine::MAX_PLAINTEXT_LIMIT {
            return Err(Error::InvalidConfig(format!(
                "max_plaintext_len must be at most {}",
                engine::MAX_PLAINTEXT_LIMIT
            )));
        }
        if self.event_capacity == 0 {
            return Err(Error::InvalidConfig(
                "event_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// CORE INSTANCE
// ============================================================================

/// Global Courier Core instance
static CORE_INSTANCE: OnceCell<Arc<CourierCore>> = OnceCell::new();

/// A decrypted text message and who sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Decrypted message text
    pub text: String,
    /// Authenticated key of the sender
    pub sender_key: PublicKey,
    /// Identifier of the sender, if their key is registered
    pub sender: Option<String>,
}

/// The Courier Core instance that wires the registry, identity, and engines
///
/// ## Lifecycle
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       COURIER CORE LIFECYCLE                            │
/// ├─────────────────────────────────────────────────────────────────────────┤
/// │                                                                         │
/// │  1. Initialize (once per process)                                      │
/// │     ┌──────────────┐                                                   │
/// │     │ CourierCore::│──► Validate config                                │
/// │     │ initialize() │──► Load or generate the local identity            │
/// │     └──────────────┘──► Create empty registry                          │
/// │            │                                                           │
/// │            ▼                                                           │
/// │  2. Populate Registry                                                  │
/// │     ┌──────────────┐                                                   │
/// │     │ registry()   │──► restore() a saved snapshot, or                 │
/// │     │              │──► add() parties as the user enters them          │
/// │     └──────────────┘                                                   │
/// │            │                                                           │
/// │            ▼                                                           │
/// │  3. Ready for Operations                                               │
/// │     ┌──────────────┐                                                   │
/// │     │  Active      │◄─► encrypt_message(party, text)                   │
/// │     │  State       │◄─► decrypt_message / open_message(text)           │
/// │     └──────────────┘◄─► add / update / rename / remove parties         │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug)]
pub struct CourierCore {
    config: CoreConfig,
    identity: IdentityManager,
    registry: PartyRegistry,
    encryptor: EncryptionEngine,
    decryptor: DecryptionEngine,
}

impl CourierCore {
    /// Create a standalone core
    ///
    /// ## Errors
    ///
    /// - `InvalidConfig` if `config` fails validation
    /// - `IdentityUnavailable` if the identity cannot be loaded or created
    pub fn new(config: CoreConfig, source: &dyn IdentitySource) -> Result<Self> {
        config.validate()?;
        let identity = IdentityManager::initialize(source)?;

        Ok(Self {
            registry: PartyRegistry::with_event_capacity(config.event_capacity),
            encryptor: EncryptionEngine::new(config.max_plaintext_len),
            decryptor: DecryptionEngine::new(config.max_plaintext_len),
            identity,
            config,
        })
    }

    /// Initialize the process-wide core
    ///
    /// This should be called once at application startup.
    ///
    /// ## Example
    ///
    /// ```ignore
    /// use courier_core::{CoreConfig, CourierCore, MemoryIdentitySource};
    ///
    /// let core = CourierCore::initialize(CoreConfig::default(), &keystore)?;
    /// ```
    pub fn initialize(config: CoreConfig, source: &dyn IdentitySource) -> Result<Arc<Self>> {
        let mut created = false;
        let core = CORE_INSTANCE.get_or_try_init(|| {
            created = true;
            tracing::info!("Initializing Courier Core v{}", version());
            Self::new(config, source).map(Arc::new)
        })?;

        if !created {
            tracing::warn!("Courier Core is already initialized");
            return Err(Error::AlreadyInitialized);
        }

        tracing::info!("Courier Core initialized successfully");
        Ok(Arc::clone(core))
    }

    /// Get the global core instance
    ///
    /// Returns an error if the core hasn't been initialized.
    pub fn instance() -> Result<Arc<Self>> {
        CORE_INSTANCE.get().cloned().ok_or(Error::NotInitialized)
    }

    /// Check if the core is initialized
    pub fn is_initialized() -> bool {
        CORE_INSTANCE.get().is_some()
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// The active configuration
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// The party registry
    pub fn registry(&self) -> &PartyRegistry {
        &self.registry
    }

    /// The local identity
    pub fn identity(&self) -> &IdentityManager {
        &self.identity
    }

    /// The local public key in shareable text form
    pub fn local_public_key(&self) -> String {
        self.identity.local_public_key()
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Encrypt bytes for a registered party
    ///
    /// ## Errors
    ///
    /// - `PartyNotFound` if `identifier` is not registered
    /// - `EncryptionFailure` if the plaintext exceeds the configured limit
    pub fn encrypt_for(&self, identifier: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        let party = self
            .registry
            .lookup(identifier)
            .ok_or_else(|| Error::PartyNotFound(identifier.to_string()))?;

        self.encryptor
            .encrypt(plaintext, party.public_key(), self.identity.key_pair())
    }

    /// Encrypt a text message for a registered party, returning base64 text
    pub fn encrypt_message(&self, identifier: &str, message: &str) -> Result<String> {
        let envelope = self.encrypt_for(identifier, message.as_bytes())?;
        Ok(codec::encode_ciphertext(&envelope))
    }

    /// Decrypt an envelope addressed to the local identity
    pub fn decrypt(&self, envelope: &[u8]) -> Result<Vec<u8>> {
        self.decryptor.decrypt(envelope, self.identity.key_pair())
    }

    /// Decrypt base64 envelope text into a text message
    ///
    /// A plaintext that is not UTF-8 is reported as `DecryptionFailure`.
    pub fn decrypt_message(&self, text: &str) -> Result<String> {
        self.open_text(text).map(|(message, _)| message)
    }

    /// Decrypt base64 envelope text and attribute it to a registered party
    pub fn open_message(&self, text: &str) -> Result<ReceivedMessage> {
        let (text, sender_key) = self.open_text(text)?;
        let sender = self
            .registry
            .find_by_key(&sender_key)
            .map(|party| party.identifier().to_string());

        Ok(ReceivedMessage {
            text,
            sender_key,
            sender,
        })
    }

    fn open_text(&self, text: &str) -> Result<(String, PublicKey)> {
        let envelope = codec::decode_ciphertext_with_limit(text, self.decryptor.max_envelope_len())?;
        let mut opened = self.decryptor.open(&envelope, self.identity.key_pair())?;

        let sender = opened.sender;
        let message = String::from_utf8(std::mem::take(&mut *opened.plaintext)).map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            Error::DecryptionFailure
        })?;

        Ok((message, sender))
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Courier Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================
