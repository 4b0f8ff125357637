//! # Envelope Engines
//!
//! Sealing plaintext for a registered party and opening envelopes addressed
//! to the local identity.
//!
//! ## Envelope Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          ENVELOPE (v1)                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   offset  size   field                                                 │
//! │   ──────  ────   ─────────────────────────────────────────              │
//! │        0     1   version (0x01)                        ┐               │
//! │        1    32   sender static public key              ├ AAD (65)      │
//! │       33    32   ephemeral public key                  ┘               │
//! │       65    12   AES-GCM nonce                                         │
//! │       77  n+16   ciphertext || tag                                     │
//! │                                                                         │
//! │   Minimum size (empty plaintext): 93 bytes                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operation Lifecycle
//!
//! ```text
//!   Idle ──► Validating ──► Encrypting / Decrypting ──► Success
//!                 │                     │
//!                 └─────────────────────┴──────────────► Failed
//! ```
//!
//! Both engines are plain configuration holders. They are `Copy`, hold no
//! key material, and can be shared freely across threads.

mod decrypt;
mod encrypt;

pub use decrypt::{DecryptionEngine, OpenedMessage};
pub use encrypt::EncryptionEngine;

use crate::crypto::{NONCE_SIZE, PUBLIC_KEY_SIZE, TAG_SIZE};

/// Current envelope format version
pub const ENVELOPE_VERSION: u8 = 0x01;

/// Bytes covered by the AEAD as associated data
pub const AAD_LEN: usize = 1 + PUBLIC_KEY_SIZE + PUBLIC_KEY_SIZE;

/// Bytes preceding the sealed body
pub const HEADER_LEN: usize = AAD_LEN + NONCE_SIZE;

/// Size of an envelope carrying an empty plaintext
pub const MIN_ENVELOPE_LEN: usize = HEADER_LEN + TAG_SIZE;

/// Default plaintext limit (1 MiB)
pub const DEFAULT_MAX_PLAINTEXT_LEN: usize = 1024 * 1024;

/// Largest plaintext limit a configuration may request (256 MiB)
///
/// Keeps the envelope size and its base64 text length within `usize` on
/// every supported target.
pub const MAX_PLAINTEXT_LIMIT: usize = 256 * 1024 * 1024;

/// Size of the envelope produced for a plaintext of `plaintext_len` bytes
pub fn envelope_len(plaintext_len: usize) -> usize {
    MIN_ENVELOPE_LEN.saturating_add(plaintext_len)
}

// ============================================================================
// TESTS
// ============================================================================
