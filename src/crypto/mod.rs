//! # Cryptography Module
//!
//! This module provides the cryptographic primitives used by Courier Core.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    KEY TYPES                                    │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  IdentityKeyPair (X25519)           PublicKey (X25519)         │   │
//! │  │  • Local user only                  • One per registered party │   │
//! │  │  • Generated once or loaded         • Validated on decode      │   │
//! │  │  • Zeroized on drop                 • Canonical, not low-order │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ENVELOPE SCHEME                                 │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  1. Key Agreement: X25519                                       │   │
//! │  │     ephemeral × recipient  and  sender × recipient             │   │
//! │  │                                                                 │   │
//! │  │  2. Key Derivation: HKDF-SHA256                                 │   │
//! │  │     (es || ss) → 256-bit message key                           │   │
//! │  │                                                                 │   │
//! │  │  3. Encryption: AES-256-GCM                                     │   │
//! │  │     • 96-bit random nonce per message                          │   │
//! │  │     • 128-bit authentication tag                               │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices & Rationale
//!
//! | Algorithm | Purpose | Why Chosen |
//! |-----------|---------|------------|
//! | X25519 | Key Agreement | Fast ECDH, small keys, constant-time in dalek |
//! | AES-256-GCM | Encryption | Hardware acceleration, AEAD |
//! | HKDF-SHA256 | Key Derivation | Industry standard, well-analyzed |
//! | SHA-256 | Fingerprints | Short human-comparable key digests |

mod encryption;
mod kdf;
mod keys;

pub use encryption::{decrypt, encrypt, EncryptionKey, Nonce, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use kdf::{derive_envelope_key, key_fingerprint};
pub use keys::{IdentityKeyPair, PublicKey, KEY_ALGORITHM_X25519};

/// Size of public keys in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of secret keys in bytes
pub const SECRET_KEY_SIZE: usize = 32;
